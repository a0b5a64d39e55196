//! Populating a store from external aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::BindingError;
use crate::store::Bindings;

/// Populates a [`Bindings`] store from an external source aggregate.
///
/// Implementations decide which entries of the source become bindings and
/// under which names. The engine treats loaders as collaborators; only
/// the map-backed loader ships with the core.
pub trait Loader<S: ?Sized> {
    /// Binds the selected entries of `source` into `bindings`.
    fn load(&self, bindings: &Bindings, source: &S) -> Result<(), BindingError>;
}

type KeyFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type KeyMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Loads bindings from a string-keyed map, one binding per retained key.
///
/// ```rust,ignore
/// let loader = MapLoader::new()
///     .filter(|key| key != "password")
///     .rename(|key| format!("input_{key}"));
/// loader.load(&bindings, &source_map)?;
/// ```
#[derive(Clone, Default)]
pub struct MapLoader {
    filter: Option<KeyFilter>,
    rename: Option<KeyMapper>,
}

impl MapLoader {
    /// A loader that binds every entry under its own key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the keys the predicate accepts.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Maps source keys to binding names.
    #[must_use]
    pub fn rename(mut self, rename: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.rename = Some(Arc::new(rename));
        self
    }
}

impl<V> Loader<HashMap<String, V>> for MapLoader
where
    V: Clone + Send + Sync + 'static,
{
    fn load(&self, bindings: &Bindings, source: &HashMap<String, V>) -> Result<(), BindingError> {
        for (key, value) in source {
            if let Some(filter) = &self.filter
                && !filter(key)
            {
                continue;
            }
            let name = match &self.rename {
                Some(rename) => rename(key),
                None => key.clone(),
            };
            bindings.bind_value(name, value.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source() -> HashMap<String, i64> {
        HashMap::from([
            (String::from("a"), 1),
            (String::from("b"), 2),
            (String::from("secret"), 3),
        ])
    }

    #[test]
    fn loads_every_entry_by_default() {
        let bindings = Bindings::new();
        MapLoader::new().load(&bindings, &source()).unwrap();
        assert!(bindings.contains("a"));
        assert!(bindings.contains("b"));
        assert!(bindings.contains("secret"));
    }

    #[test]
    fn filter_excludes_keys() {
        let bindings = Bindings::new();
        MapLoader::new()
            .filter(|key| key != "secret")
            .load(&bindings, &source())
            .unwrap();
        assert!(bindings.contains("a"));
        assert!(!bindings.contains("secret"));
    }

    #[test]
    fn rename_maps_binding_names() {
        let bindings = Bindings::new();
        MapLoader::new()
            .rename(|key| format!("input_{key}"))
            .load(&bindings, &source())
            .unwrap();
        assert_eq!(
            *bindings.get("input_a").unwrap().get::<i64>().unwrap(),
            1
        );
        assert!(!bindings.contains("a"));
    }
}
