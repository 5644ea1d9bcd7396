//! Vendor-prefix metadata used by rework plugins that mirror or prune
//! prefixed declarations and prefixed pseudo-elements.

/// Which namespace a prefix lookup is about — a property (`transform`) or a
/// selector-level pseudo-element (`::selection`). The two never collide in
/// practice, but a table still needs the discriminator: without it a
/// `selection` property and a `::selection` pseudo-element would share the
/// same string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixKind {
    Property,
    PseudoElement,
}

/// Source of vendor-prefix requirement data: for a given unprefixed
/// property or pseudo-element name and vendor, the last browser version
/// that still required the prefix, if any. `None` means the vendor never
/// needed a prefix for that name, or the name is unknown to this table.
pub trait PrefixTable {
    /// Returns the last version of `vendor` requiring a prefix for `name`
    /// of kind `kind`, or `None` if no prefix is (or ever was) required.
    fn last_version_requiring_prefix(&self, kind: PrefixKind, name: &str, vendor: &str) -> Option<&str>;

    /// Vendors this table has any data for, in a stable order.
    fn known_vendors(&self) -> Vec<&str>;
}

/// Default table with no prefix data at all — every lookup is `None`. Used
/// when no explicit prefix policy is configured, so prefix-mirroring
/// plugins degrade to a no-op rather than panicking on a missing table.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrefixData;

impl PrefixTable for NoPrefixData {
    fn last_version_requiring_prefix(&self, _kind: PrefixKind, _name: &str, _vendor: &str) -> Option<&str> {
        None
    }

    fn known_vendors(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A small built-in table covering the handful of historically-prefixed
/// properties and pseudo-elements exercised by this crate's own tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPrefixData;

impl PrefixTable for BuiltinPrefixData {
    fn last_version_requiring_prefix(&self, kind: PrefixKind, name: &str, vendor: &str) -> Option<&str> {
        match kind {
            PrefixKind::Property => match (name, vendor) {
                ("border-radius", "moz") => Some("3.6"),
                ("box-sizing", "moz") => Some("28"),
                ("transform", "webkit") => Some("35"),
                ("transform", "ms") => Some("9"),
                ("box-shadow", "webkit") => Some("9"),
                ("box-shadow", "moz") => Some("3.6"),
                ("user-select", "moz") => Some("68"),
                ("user-select", "webkit") => Some("53"),
                ("user-select", "ms") => Some("10"),
                _ => None,
            },
            PrefixKind::PseudoElement => match (name, vendor) {
                ("selection", "moz") => Some("68"),
                ("placeholder", "moz") => Some("51"),
                ("placeholder", "webkit") => Some("57"),
                ("placeholder", "ms") => Some("18"),
                _ => None,
            },
        }
    }

    fn known_vendors(&self) -> Vec<&str> {
        vec!["webkit", "moz", "ms"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_prefix_data_is_always_none() {
        let table = NoPrefixData;
        assert_eq!(table.last_version_requiring_prefix(PrefixKind::Property, "transform", "webkit"), None);
    }

    #[test]
    fn builtin_table_knows_transform() {
        let table = BuiltinPrefixData;
        assert_eq!(table.last_version_requiring_prefix(PrefixKind::Property, "transform", "webkit"), Some("35"));
        assert_eq!(table.last_version_requiring_prefix(PrefixKind::Property, "color", "webkit"), None);
    }

    #[test]
    fn builtin_table_knows_selection_pseudo_element() {
        let table = BuiltinPrefixData;
        assert_eq!(table.last_version_requiring_prefix(PrefixKind::PseudoElement, "selection", "moz"), Some("68"));
        assert_eq!(table.last_version_requiring_prefix(PrefixKind::Property, "selection", "moz"), None);
    }
}
