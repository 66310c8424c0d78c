/// Candidate delimiters in tie-break order.
pub const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

pub struct CsvParser;

impl CsvParser {
    /// Picks the most frequent candidate delimiter in `line`.
    /// Counting is literal (quotes are not considered). Ties go to the
    /// earlier candidate, and a line with none of them falls back to comma.
    pub fn detect_delimiter(line: &str) -> char {
        let mut best = ',';
        let mut best_count = 0;
        for candidate in CANDIDATE_DELIMITERS {
            let count = line.chars().filter(|&c| c == candidate).count();
            if count > best_count {
                best = candidate;
                best_count = count;
            }
        }
        best
    }

    /// Splits a raw line into trimmed fields.
    ///
    /// A delimiter only separates fields when the number of quote characters
    /// after it on the line is even. This is a parity heuristic rather than
    /// real CSV escaping; unbalanced quotes can still mis-split.
    pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
        let chars: Vec<char> = line.chars().collect();

        // quotes_after[i] = number of '"' in chars[i..]
        let mut quotes_after = vec![0usize; chars.len() + 1];
        for i in (0..chars.len()).rev() {
            quotes_after[i] = quotes_after[i + 1] + usize::from(chars[i] == '"');
        }

        let mut fields = Vec::new();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if c == delimiter && quotes_after[i + 1] % 2 == 0 {
                fields.push(Self::clean_field(&current));
                current.clear();
            } else {
                current.push(c);
            }
        }
        fields.push(Self::clean_field(&current));
        fields
    }

    /// Trims and removes one layer of surrounding double quotes.
    fn clean_field(raw: &str) -> String {
        let trimmed = raw.trim();
        let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };
        unquoted.trim().to_string()
    }
}

/// Human readable name for a delimiter, for logs and the status bar.
pub fn delimiter_name(delimiter: char) -> &'static str {
    match delimiter {
        ',' => "comma",
        ';' => "semicolon",
        '\t' => "tab",
        '|' => "pipe",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_most_frequent() {
        assert_eq!(CsvParser::detect_delimiter("a;b;c,d"), ';');
        assert_eq!(CsvParser::detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(CsvParser::detect_delimiter("a|b|c|d"), '|');
    }

    #[test]
    fn test_detect_tie_prefers_earlier_candidate() {
        assert_eq!(CsvParser::detect_delimiter("a;b,c"), ',');
        assert_eq!(CsvParser::detect_delimiter("a|b\tc"), '\t');
    }

    #[test]
    fn test_detect_falls_back_to_comma() {
        assert_eq!(CsvParser::detect_delimiter("single"), ',');
        assert_eq!(CsvParser::detect_delimiter(""), ',');
    }

    #[test]
    fn test_parse_simple() {
        let fields = CsvParser::parse_line("a, b ,c", ',');
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_quotes() {
        let fields = CsvParser::parse_line("a,\"b,c\",d", ',');
        assert_eq!(fields, vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_parse_other_delimiter_and_empty_cells() {
        let fields = CsvParser::parse_line("20대;;교통;", ';');
        assert_eq!(fields, vec!["20대", "", "교통", ""]);
    }

    #[test]
    fn test_parse_strips_only_one_quote_layer() {
        let fields = CsvParser::parse_line("\" x \",y", ',');
        assert_eq!(fields, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_doubled_quotes_keep_inner_layer() {
        let fields = CsvParser::parse_line("\"\"x\"\",y", ',');
        assert_eq!(fields, vec!["\"x\"", "y"]);
    }

    #[test]
    fn test_parse_odd_quotes_after_delimiter_do_not_split() {
        // One quote follows the first comma, none follow the second.
        let fields = CsvParser::parse_line("a,b\"c,d", ',');
        assert_eq!(fields, vec!["a,b\"c", "d"]);
    }

    #[test]
    fn test_delimiter_name() {
        assert_eq!(delimiter_name('\t'), "tab");
        assert_eq!(delimiter_name('#'), "other");
    }
}
