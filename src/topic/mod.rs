//! Топики: маршрутные ключи из набора атрибутов.
//!
//! Один и тот же тип служит и шаблоном подписки, и адресом события.
//! Значение [`ANY`] совпадает с любым значением того же ключа.
//!
//! - `attrs`: отсортированный набор пар ключ/значение ([`AttrMap`]).

pub mod attrs;

use std::{fmt, str::FromStr, sync::Arc};

pub use attrs::{Attr, AttrMap};

use crate::error::ParseError;

/// Шаблон, совпадающий с любым значением ключа.
pub const ANY: &str = "*";

/// Неизменяемый топик. Клонирование дешёвое: атрибуты разделяются
/// через `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Topic {
    attrs: Arc<AttrMap>,
}

impl Topic {
    /// Топик без атрибутов. Как шаблон подписки совпадает с любым событием.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Создаёт топик из токенов `"key=value"` или пар `"key", "value"`.
    ///
    /// ```
    /// use taghub::Topic;
    ///
    /// let t = Topic::parse(["type=alert", "severity", "high"]).unwrap();
    /// assert_eq!(t.get("severity"), Some("high"));
    /// assert_eq!(t.to_string(), "severity=high type=alert");
    /// ```
    pub fn parse<I, S>(tokens: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AttrMap::parse(tokens).map(Self::from)
    }

    /// Новый топик: текущие атрибуты, переопределённые переданными.
    pub fn with<I, S>(
        &self,
        tokens: I,
    ) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let other = AttrMap::parse(tokens)?;
        Ok(Self::from(self.attrs.merge(&other)))
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.attrs.get(key)
    }

    /// Атрибуты в порядке возрастания ключей.
    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn attrs(&self) -> &AttrMap {
        &self.attrs
    }

    /// Удовлетворяет ли `other` шаблону `self` (см. [`AttrMap::matches`]).
    pub fn matches(
        &self,
        other: &Topic,
    ) -> bool {
        self.attrs.matches(&other.attrs)
    }
}

impl From<AttrMap> for Topic {
    fn from(attrs: AttrMap) -> Self {
        Self {
            attrs: Arc::new(attrs),
        }
    }
}

impl<'a> IntoIterator for &'a Topic {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Topic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Display::fmt(&*self.attrs, f)
    }
}

impl FromStr for Topic {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AttrMap>().map(Self::from)
    }
}

/// Всё, из чего можно получить топик: готовый [`Topic`], строка в форме
/// `Display` или набор токенов.
pub trait IntoTopic {
    fn into_topic(self) -> Result<Topic, ParseError>;
}

impl IntoTopic for Topic {
    fn into_topic(self) -> Result<Topic, ParseError> {
        Ok(self)
    }
}

impl IntoTopic for &Topic {
    fn into_topic(self) -> Result<Topic, ParseError> {
        Ok(self.clone())
    }
}

impl IntoTopic for &str {
    fn into_topic(self) -> Result<Topic, ParseError> {
        self.parse()
    }
}

impl<S: AsRef<str>> IntoTopic for &[S] {
    fn into_topic(self) -> Result<Topic, ParseError> {
        Topic::parse(self)
    }
}

impl<S: AsRef<str>> IntoTopic for Vec<S> {
    fn into_topic(self) -> Result<Topic, ParseError> {
        Topic::parse(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoTopic for [S; N] {
    fn into_topic(self) -> Result<Topic, ParseError> {
        Topic::parse(self)
    }
}
