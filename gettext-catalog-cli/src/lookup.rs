use gettext_catalog::Catalog;

/// One message lookup as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub context: String,
    pub id: String,
    pub plural: Option<String>,
    pub count: Option<u64>,
}

/// Resolves a query against a catalog. A plural id or a count makes it a
/// plural lookup; a count without a plural id still selects among the
/// stored forms.
pub fn resolve<'a>(catalog: &'a Catalog, query: &'a Query) -> &'a str {
    if query.plural.is_none() && query.count.is_none() {
        return catalog.pgettext(&query.context, &query.id);
    }
    catalog.pngettext(
        &query.context,
        &query.id,
        query.plural.as_deref().unwrap_or_default(),
        query.count.unwrap_or(1),
    )
}
