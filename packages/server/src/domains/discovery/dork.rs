//! Search-engine dork queries for finding job boards by keyword.

/// Dork queries for a keyword, in a fixed order.
pub fn generate_dork_queries(keyword: &str) -> Vec<String> {
    let keyword = keyword.trim();
    vec![
        format!("intext:\"{keyword}\" AND (\"careers\" OR \"jobs\")"),
        format!("site:greenhouse.io \"{keyword}\""),
        format!("site:lever.co \"{keyword}\""),
        format!("site:ashbyhq.com \"{keyword}\""),
        format!("inurl:careers \"{keyword}\""),
        format!("\"we are hiring\" \"{keyword}\""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_query_per_pattern() {
        let queries = generate_dork_queries("rust engineer");

        assert_eq!(queries.len(), 6);
        assert_eq!(
            queries[0],
            "intext:\"rust engineer\" AND (\"careers\" OR \"jobs\")"
        );
        assert_eq!(queries[1], "site:greenhouse.io \"rust engineer\"");
        assert_eq!(queries[5], "\"we are hiring\" \"rust engineer\"");
    }

    #[test]
    fn trims_keyword() {
        assert_eq!(
            generate_dork_queries("  golang ")[4],
            "inurl:careers \"golang\""
        );
    }
}
