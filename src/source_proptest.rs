//! Property-based tests for locator handling and values merging.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::source::{decode_directory_name, derive_directory_name, ProtocolTable};
    use crate::values::{merge_values, Values};
    use proptest::prelude::*;
    use serde_yaml::Value;

    fn values_strategy() -> impl Strategy<Value = Values> {
        prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8).prop_map(|map| {
            map.into_iter()
                .map(|(k, v)| (Value::from(k), Value::from(v)))
                .collect()
        })
    }

    proptest! {
        /// Property: decoding a derived directory name gives back the locator
        #[test]
        fn directory_name_round_trips(locator in ".+") {
            let name = derive_directory_name(&locator);
            prop_assert_eq!(decode_directory_name(&name), Some(locator));
        }

        /// Property: derived directory names are a single path component
        #[test]
        fn directory_name_is_filesystem_safe(locator in ".*") {
            let name = derive_directory_name(&locator);
            for ch in ['/', '\\', ':', '*', '?', '"', '<', '>', '|'] {
                prop_assert!(!name.contains(ch), "'{}' in {}", ch, name);
            }
        }

        /// Property: structured names carry no enclosing punctuation and no
        /// redundant name prefix in the version
        #[test]
        fn parsed_fields_are_clean(
            owner in "[a-z][a-z0-9-]{0,10}",
            repository in "[a-z][a-z0-9_-]{0,10}",
            version in "v[0-9]{1,2}\\.[0-9]{1,2}",
            git_suffix in any::<bool>(),
        ) {
            let protocols = ProtocolTable::standard().unwrap();
            let locator = format!(
                "git::https://example.com/{}/{}{}?ref={}-{}",
                owner,
                repository,
                if git_suffix { ".git" } else { "" },
                repository,
                version,
            );

            let fields = protocols.parse(&locator).unwrap();

            prop_assert_eq!(&fields.owner, &owner);
            prop_assert_eq!(&fields.repository, &repository);
            prop_assert_eq!(fields.version(), version);
            prop_assert!(!fields.directory_name().contains('/'));
        }

        /// Property: every override key wins and every other default survives
        #[test]
        fn merge_precedence(defaults in values_strategy(), overrides in values_strategy()) {
            let merged = merge_values(&defaults, Some(&overrides));

            for (key, value) in &overrides {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in &defaults {
                if !overrides.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
            prop_assert!(merged.len() <= defaults.len() + overrides.len());
        }
    }
}
