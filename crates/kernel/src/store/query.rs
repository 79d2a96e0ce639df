//! Blog list query builder using SeaQuery.
//!
//! Translates a [`BlogFilter`] into PostgreSQL with the same semantics as
//! [`BlogFilter::matches`]: keyword ILIKE over title, content and tags,
//! published/category equality, and the tenant visibility predicate.

use sea_query::{
    Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
};

use super::{BlogFilter, PageRequest};

const BLOGS: &str = "blogs";

/// Builds SELECT and COUNT statements for blog listings.
pub struct BlogQueryBuilder<'a> {
    filter: &'a BlogFilter,
}

impl<'a> BlogQueryBuilder<'a> {
    pub fn new(filter: &'a BlogFilter) -> Self {
        Self { filter }
    }

    /// Build the page query, newest first.
    pub fn build(&self, page: PageRequest) -> String {
        let mut query = Query::select();
        query.column(Asterisk).from(Alias::new(BLOGS));

        self.add_filters(&mut query);

        query
            .order_by(Alias::new("created_at"), Order::Desc)
            .order_by(Alias::new("id"), Order::Desc)
            .limit(page.limit())
            .offset(page.offset());

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for total results.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count()).from(Alias::new(BLOGS));

        self.add_filters(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    fn add_filters(&self, query: &mut SelectStatement) {
        for condition in self.conditions() {
            query.and_where(condition);
        }
    }

    fn conditions(&self) -> Vec<SimpleExpr> {
        let mut conditions = Vec::new();

        if let Some(ref keyword) = self.filter.keyword {
            let pattern = format!("%{}%", escape_like_wildcards(keyword));
            conditions.push(Expr::cust_with_values(
                "(title ILIKE $1 OR content ILIKE $2 OR EXISTS \
                 (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $3))",
                [pattern.clone(), pattern.clone(), pattern],
            ));
        }

        if let Some(published) = self.filter.published {
            conditions.push(Expr::col(Alias::new("published")).eq(published));
        }

        if let Some(ref category) = self.filter.category {
            conditions.push(Expr::col(Alias::new("category")).eq(category.as_str()));
        }

        // Same predicate as access::is_visible_to_tenant.
        if let Some(ref tenant) = self.filter.tenant {
            conditions.push(Expr::col(Alias::new("published")).eq(true));
            conditions.push(Expr::cust_with_values(
                "(site_id = $1 OR $2 = ANY(sites) OR is_global)",
                [tenant.clone(), tenant.clone()],
            ));
        }

        conditions
    }
}

/// Escape LIKE wildcards so a keyword only ever matches literally.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_query_orders_newest_first_and_pages() {
        let filter = BlogFilter::new();
        let sql = BlogQueryBuilder::new(&filter).build(PageRequest::new(3));

        assert!(sql.starts_with("SELECT * FROM \"blogs\""));
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY \"created_at\" DESC, \"id\" DESC"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 20"));
    }

    #[test]
    fn keyword_searches_title_content_and_tags() {
        let filter = BlogFilter::new().with_keyword(Some("rust".into()));
        let sql = BlogQueryBuilder::new(&filter).build(PageRequest::default());

        assert!(sql.contains("title ILIKE"));
        assert!(sql.contains("content ILIKE"));
        assert!(sql.contains("unnest(tags)"));
        assert!(sql.contains("%rust%"));
    }

    #[test]
    fn tenant_scope_requires_published() {
        let filter = BlogFilter::new().for_tenant(Some("tenant-a".into()));
        let sql = BlogQueryBuilder::new(&filter).build_count();

        assert!(sql.contains("COUNT(*)"));
        assert!(sql.contains("\"published\" = TRUE"));
        assert!(sql.contains("ANY(sites)"));
        assert!(sql.contains("is_global"));
        assert!(sql.contains("tenant-a"));
    }

    #[test]
    fn category_is_an_exact_match() {
        let filter = BlogFilter::new().with_category(Some("news".into()));
        let sql = BlogQueryBuilder::new(&filter).build_count();
        assert!(sql.contains("\"category\" = 'news'"));
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}
