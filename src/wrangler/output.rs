use super::Error;
use crate::Row;
use serde::Deserialize;

/// Shape of one statement's reply in the CLI's `--json` output.
#[derive(Deserialize)]
struct ResultSet {
    #[serde(default)]
    results: Vec<Row>,
}

/// Extract the result rows from mixed CLI stdout.
///
/// The CLI prints human-readable banner lines before the JSON array, so we
/// scan line by line for the first line that opens the array and parse from
/// there. "No JSON at all" and "JSON found but malformed" are distinct
/// errors; a well-formed reply with no rows is an empty, successful result.
pub fn results(stdout: &str) -> Result<Vec<Row>, Error> {
    let json = scan(stdout).ok_or(Error::NoJson)?;
    let sets: Vec<ResultSet> = serde_json::from_str(json)?;
    Ok(sets.into_iter().next().map(|s| s.results).unwrap_or_default())
}

/// Byte offset of the first line whose trimmed content opens a JSON array.
fn scan(stdout: &str) -> Option<&str> {
    let mut pos = 0;
    for line in stdout.split_inclusive('\n') {
        if line.trim_start().starts_with('[') {
            return Some(&stdout[pos..]);
        }
        pos += line.len();
    }
    None
}

/// Parse the pipe-delimited human-readable table the CLI prints without
/// `--json`: keep lines containing `│`, drop rule lines, split on `│`,
/// trim cells. The header row is returned too; callers skip it by failing
/// to parse its identifier cell.
pub fn table(stdout: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .filter(|line| line.contains('│') && !line.contains('─'))
        .map(|line| {
            line.split('│')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(String::from)
                .collect::<Vec<String>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNERED: &str = "\
 ⛅️ wrangler 3.78.10\n\
-------------------\n\
🌀 Executing on remote database review-spheres-v1-production\n\
[\n  {\n    \"results\": [\n      { \"id\": 13, \"title\": \"chicken\" },\n      { \"id\": 14, \"title\": \"cream\" }\n    ],\n    \"success\": true\n  }\n]\n";

    #[test]
    fn rows_behind_banners() {
        let rows = results(BANNERED).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id").unwrap().as_i64(), Some(13));
    }

    #[test]
    fn preserves_column_order() {
        let rows = results(BANNERED).unwrap();
        let columns: Vec<&String> = rows[0].keys().collect();
        assert_eq!(columns, ["id", "title"]);
    }

    #[test]
    fn empty_results_is_not_an_error() {
        let rows = results("[{\"results\": [], \"success\": true}]").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_results_key_is_empty() {
        let rows = results("[{\"success\": true}]").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn no_json_is_distinct_from_parse_failure() {
        assert!(matches!(results("all banners, no array"), Err(Error::NoJson)));
        assert!(matches!(results("banner\n[ not json"), Err(Error::Json(_))));
    }

    #[test]
    fn table_rows_split_and_trimmed() {
        let out = "\
banner line\n\
┌────┬───────┐\n\
│ id │ title │\n\
├────┼───────┤\n\
│ 13 │ chicken dinner │\n\
│ 14 │ cream │\n\
└────┴───────┘\n";
        let rows = table(out);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], ["13", "chicken dinner"]);
        assert_eq!(rows[2], ["14", "cream"]);
    }
}
