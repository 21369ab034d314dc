use sage_common::types::ServiceMap;

/// Merges `extra` into `base`.
///
/// Fields of an entity present in both maps are unioned, with `extra`
/// winning on field-name collisions. Entities present in only one map are
/// carried through unchanged.
pub fn merge_services(mut base: ServiceMap, extra: ServiceMap) -> ServiceMap {
    for (key, fields) in extra {
        base.entry(key).or_default().extend(fields);
    }
    base
}

/// Folds [`merge_services`] over any number of adapter outputs, left to right.
pub fn merge_all<I>(sources: I) -> ServiceMap
where
    I: IntoIterator<Item = ServiceMap>,
{
    sources
        .into_iter()
        .fold(ServiceMap::new(), merge_services)
}
