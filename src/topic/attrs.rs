use std::{collections::HashMap, fmt, str::FromStr};

use crate::error::ParseError;

use super::ANY;

/// Пара ключ/значение атрибута топика.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attr {
    key: String,
    value: String,
}

/// Неизменяемый набор атрибутов, отсортированный по ключу.
///
/// Ключи уникальны. Благодаря сортировке `matches` и `merge` проходят оба
/// набора синхронно за O(n + m).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttrMap {
    data: Vec<Attr>,
}

impl Attr {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Значение является шаблоном [`ANY`].
    pub fn is_any(&self) -> bool {
        self.value == ANY
    }
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Разбирает атрибуты из последовательности токенов.
    ///
    /// Поддерживаются две формы, их можно смешивать:
    /// - `"key=value"` одной строкой;
    /// - `"key", "value"` двумя соседними токенами.
    ///
    /// Символ `=` внутри ключа или значения экранируется как `\=`.
    /// Пустые токены на месте ключа пропускаются. При повторе ключа
    /// побеждает последнее значение.
    pub fn parse<I, S>(tokens: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = Vec::new();
        let mut tokens = tokens.into_iter().enumerate();

        while let Some((position, token)) = tokens.next() {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }

            match find_unescaped_eq(token) {
                Some(p) => data.push(Attr::new(unescape(&token[..p]), unescape(&token[p + 1..]))),
                None => {
                    let Some((_, value)) = tokens.next() else {
                        return Err(ParseError::MissingValue {
                            key: token.to_string(),
                            position,
                        });
                    };
                    data.push(Attr::new(unescape(token), unescape(value.as_ref())));
                }
            }
        }

        Ok(Self {
            data: normalize(data),
        })
    }

    /// Значение по ключу.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.data
            .binary_search_by(|attr| attr.key.as_str().cmp(key))
            .ok()
            .map(|idx| self.data[idx].value.as_str())
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.get(key).is_some()
    }

    /// Обход пар в порядке возрастания ключей.
    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.data.iter().map(|attr| attr.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.data
            .iter()
            .map(|attr| (attr.key.clone(), attr.value.clone()))
            .collect()
    }

    /// Проверяет, удовлетворяет ли `other` шаблону `self`.
    ///
    /// Каждый ключ `self` обязан присутствовать в `other`, а значения должны
    /// совпадать, либо одно из них равно [`ANY`]. Лишние ключи `other`
    /// игнорируются, поэтому отношение несимметрично.
    pub fn matches(
        &self,
        other: &AttrMap,
    ) -> bool {
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.data, &other.data);

        while i < a.len() && j < b.len() {
            match a[i].key.cmp(&b[j].key) {
                std::cmp::Ordering::Less => return false,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if !a[i].is_any() && !b[j].is_any() && a[i].value != b[j].value {
                        return false;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        i == a.len()
    }

    /// Возвращает объединение наборов. При совпадении ключа берётся
    /// значение из `other`.
    pub fn merge(
        &self,
        other: &AttrMap,
    ) -> AttrMap {
        let (a, b) = (&self.data, &other.data);
        let mut data = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);

        while i < a.len() && j < b.len() {
            match a[i].key.cmp(&b[j].key) {
                std::cmp::Ordering::Less => {
                    data.push(a[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    data.push(b[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    data.push(b[j].clone());
                    i += 1;
                    j += 1;
                }
            }
        }

        data.extend_from_slice(&a[i..]);
        data.extend_from_slice(&b[j..]);
        AttrMap { data }
    }
}

impl<'a> IntoIterator for &'a AttrMap {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Attr {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}={}", escape(&self.key), escape(&self.value))
    }
}

impl fmt::Display for AttrMap {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, attr) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{attr}")?;
        }
        Ok(())
    }
}

/// Разбирает форму, которую выдаёт `Display`: токены через пробел.
impl FromStr for AttrMap {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(split_unescaped_whitespace(s))
    }
}

/// Стабильная сортировка по ключу, затем схлопывание дублей с
/// сохранением последнего значения.
fn normalize(mut data: Vec<Attr>) -> Vec<Attr> {
    data.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out: Vec<Attr> = Vec::with_capacity(data.len());
    for attr in data {
        match out.last_mut() {
            Some(last) if last.key == attr.key => *last = attr,
            _ => out.push(attr),
        }
    }
    out
}

/// Позиция первого `=`, перед которым нет `\`.
fn find_unescaped_eq(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'=' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Снимает ровно один `\` перед любым экранированным символом.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '=' || c == '\\' || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn split_unescaped_whitespace(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
