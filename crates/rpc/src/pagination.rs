use crate::status::Status;

/// A resolved page: the ``[start, end)`` window into the result set and the token of the page
/// after it, empty on the last page.
#[derive(Debug, PartialEq, Eq)]
pub struct Page {
    pub start: usize,
    pub end: usize,
    pub next_page_token: String,
}

/// Resolves ``page_token`` against a result set of ``total_size`` items. An empty token is the
/// first page.
pub fn start_and_end_page(
    page_token: &str,
    page_size: usize,
    total_size: usize,
) -> Result<Page, Status> {
    let token = match page_token {
        "" => 0,
        token => token.parse::<usize>().map_err(|err| {
            Status::internal(format!("Could not convert page token {token:?}: {err}"))
        })?,
    };

    let start = token.saturating_mul(page_size);
    if start >= total_size {
        return Err(Status::internal(format!(
            "Page start {start} >= list {total_size}"
        )));
    }

    let end = start + page_size;
    if end >= total_size {
        return Ok(Page {
            start,
            end: total_size,
            next_page_token: String::new(),
        });
    }
    Ok(Page {
        start,
        end,
        next_page_token: (token + 1).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::status::Code;

    #[rstest]
    #[case("", 3, 8, 0, 3, "1")]
    #[case("1", 3, 8, 3, 6, "2")]
    #[case("2", 3, 8, 6, 8, "")]
    #[case("0", 10, 8, 0, 8, "")]
    #[case("0", 4, 8, 0, 4, "1")]
    #[case("1", 4, 8, 4, 8, "")]
    fn test_start_and_end_page(
        #[case] page_token: &str,
        #[case] page_size: usize,
        #[case] total_size: usize,
        #[case] start: usize,
        #[case] end: usize,
        #[case] next_page_token: &str,
    ) {
        let page = start_and_end_page(page_token, page_size, total_size).unwrap();
        assert_eq!(page.start, start);
        assert_eq!(page.end, end);
        assert_eq!(page.next_page_token, next_page_token);
    }

    #[rstest]
    #[case("3", 3, 8)]
    #[case("0", 3, 0)]
    #[case("abc", 3, 8)]
    #[case("-1", 3, 8)]
    fn test_start_and_end_page_errors(
        #[case] page_token: &str,
        #[case] page_size: usize,
        #[case] total_size: usize,
    ) {
        let status = start_and_end_page(page_token, page_size, total_size).unwrap_err();
        assert_eq!(status.code, Code::Internal);
    }
}
