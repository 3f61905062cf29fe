use std::collections::HashMap;

/// Feature count table parsed from the aggregation job's two-column
/// `key,count` output.
///
/// Counts are kept as raw strings; they are only interpreted numerically
/// at density-computation time.
#[derive(Debug, Default, Clone)]
pub struct CountTable {
    counts: HashMap<String, String>,
    order: Vec<String>,
}

impl CountTable {
    /// Parse raw count text, one record per line (`\n` or `\r\n`).
    ///
    /// A line must split on commas into exactly two fields, otherwise it
    /// is skipped without error. A repeated key keeps the value from the
    /// last line that mentioned it.
    pub fn parse(raw: &str) -> Self {
        let mut table = CountTable::default();

        for line in raw.lines() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 2 {
                continue;
            }
            table
                .counts
                .insert(fields[0].to_string(), fields[1].to_string());
            table.order.push(fields[0].to_string());
        }

        table
    }

    /// Absence is an expected outcome: features without a count row are
    /// valid and get a zero density record downstream.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.counts.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(key, count)` pairs in the order lines were accepted, repeats
    /// included. Used for display ordering only.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(move |k| (k.as_str(), self.counts[k].as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_field_lines() {
        let table = CountTable::parse("a,1\nb,2\n");
        assert_eq!(table.get("a"), Some("1"));
        assert_eq!(table.get("b"), Some("2"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn drops_lines_without_exactly_two_fields() {
        let table = CountTable::parse("c,1,2\njustakey\na,5\n");
        assert_eq!(table.get("c"), None);
        assert_eq!(table.get("justakey"), None);
        assert_eq!(table.get("a"), Some("5"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_key_is_last_write_wins() {
        let table = CountTable::parse("a,1\nb,2\na,3\n");
        assert_eq!(table.get("a"), Some("3"));
        // Both occurrences stay in the display order.
        let keys: Vec<&str> = table.iter_ordered().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn handles_crlf_and_blank_lines() {
        let table = CountTable::parse("a,1\r\n\r\nb,2\r\n");
        assert_eq!(table.get("a"), Some("1"));
        assert_eq!(table.get("b"), Some("2"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn empty_second_field_is_kept() {
        // "x," still splits into two fields and is registered as-is.
        let table = CountTable::parse("x,\n");
        assert_eq!(table.get("x"), Some(""));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = CountTable::parse("");
        assert!(table.is_empty());
        assert_eq!(table.iter_ordered().count(), 0);
    }
}
