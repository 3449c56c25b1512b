//! Fact name index

use std::collections::BTreeMap;

/// Group names by their uppercased first character.
///
/// Groups come back sorted by letter; names keep their input order within a
/// group. Empty names are skipped.
pub fn group_by_initial<I, S>(names: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        let name = name.into();
        let Some(first) = name.chars().next() else {
            continue;
        };
        groups
            .entry(first.to_uppercase().collect())
            .or_default()
            .push(name);
    }
    groups.into_iter().collect()
}
