use crate::config::PaginationConfig;
use serde_json::{json, Value};
use url::Url;

/// One page of results plus the links around it
#[derive(Debug)]
pub struct Page<T> {
    pub count: usize,
    pub num_pages: usize,
    pub number: usize,
    pub results: Vec<T>,
}

/// Cut `items` into the requested page. Bad or out-of-range values are
/// clamped: page below 1 is the first page, past the end is the last one.
pub fn paginate<T>(
    items: Vec<T>,
    page: Option<&str>,
    page_size: Option<&str>,
    config: &PaginationConfig,
) -> Page<T> {
    let size = page_size
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(config.default_page_size)
        .min(config.max_page_size);
    let count = items.len();
    let num_pages = count.div_ceil(size).max(1);
    let number = page
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, num_pages);

    let results = items
        .into_iter()
        .skip((number - 1) * size)
        .take(size)
        .collect();
    Page {
        count,
        num_pages,
        number,
        results,
    }
}

/// `request_uri` with its `page` parameter replaced
pub fn page_link(request_uri: &str, page: usize) -> Option<String> {
    let mut url = Url::parse(request_uri).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page.to_string());
    Some(url.to_string())
}

impl<T: serde::Serialize> Page<T> {
    pub fn into_json(self, request_uri: &str) -> Value {
        let next = (self.number < self.num_pages)
            .then(|| page_link(request_uri, self.number + 1))
            .flatten();
        let previous = (self.number > 1)
            .then(|| page_link(request_uri, self.number - 1))
            .flatten();
        json!({
            "count": self.count,
            "num_pages": self.num_pages,
            "next": next,
            "previous": previous,
            "results": self.results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_page_size: 2,
            max_page_size: 3,
        }
    }

    #[test]
    fn test_pages_are_clamped() {
        let items: Vec<u32> = (1..=5).collect();
        let first = paginate(items.clone(), None, None, &config());
        assert_eq!(first.results, vec![1, 2]);
        assert_eq!(first.num_pages, 3);

        let last = paginate(items.clone(), Some("99"), None, &config());
        assert_eq!(last.number, 3);
        assert_eq!(last.results, vec![5]);

        let capped = paginate(items.clone(), Some("0"), Some("50"), &config());
        assert_eq!(capped.number, 1);
        assert_eq!(capped.results, vec![1, 2, 3]);

        let empty = paginate(Vec::<u32>::new(), Some("2"), None, &config());
        assert_eq!(empty.num_pages, 1);
        assert!(empty.results.is_empty());
    }

    #[test]
    fn test_links_replace_page_param() {
        let page = paginate((1..=5).collect::<Vec<u32>>(), Some("2"), None, &config());
        let body = page.into_json("https://testserver/api/courses?page=2&depth=1");
        assert_eq!(body["count"], 5);
        assert_eq!(body["next"], "https://testserver/api/courses?depth=1&page=3");
        assert_eq!(body["previous"], "https://testserver/api/courses?depth=1&page=1");

        let single = paginate(vec![1u32], None, None, &config());
        let body = single.into_json("https://testserver/api/courses");
        assert!(body["next"].is_null());
        assert!(body["previous"].is_null());
    }
}
