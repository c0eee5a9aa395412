use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::model::{OcrToken, RawTable};

pub const DEFAULT_HEADERS: [&str; 5] = ["खाता संख्या", "खेवट", "नाम", "रकबा", "फसल"];

const TSV_WORD_LEVEL: u32 = 5;
const TSV_COLUMNS: usize = 12;

pub fn default_headers() -> Vec<String> {
    DEFAULT_HEADERS.iter().map(|header| (*header).to_string()).collect()
}

pub fn positional_headers(width: usize) -> Vec<String> {
    (1..=width).map(|index| format!("col_{index}")).collect()
}

fn is_header_line(line: &str, known_headers: &[String]) -> bool {
    known_headers
        .iter()
        .any(|header| line.contains(header.as_str()))
}

fn fixed_width_row<'a>(tokens: impl Iterator<Item = &'a str>, width: usize) -> Vec<String> {
    let mut row = tokens.take(width).map(str::to_string).collect::<Vec<_>>();
    row.resize(width, String::new());
    row
}

pub fn tokenize(raw_text: &str, known_headers: &[String]) -> RawTable {
    let width = known_headers.len();
    let rows = raw_text
        .lines()
        .filter(|line| !is_header_line(line, known_headers))
        .filter(|line| line.split_whitespace().next().is_some())
        .map(|line| fixed_width_row(line.split_whitespace(), width))
        .collect();

    RawTable {
        headers: known_headers.to_vec(),
        rows,
    }
}

pub fn tokenize_blocks(tokens: &[OcrToken], known_headers: &[String]) -> RawTable {
    let mut blocks: Vec<(u32, Vec<&str>)> = Vec::new();
    for token in tokens {
        let text = token.text.trim();
        if text.is_empty() {
            continue;
        }
        match blocks.iter_mut().find(|(block, _)| *block == token.block_num) {
            Some((_, words)) => words.push(text),
            None => blocks.push((token.block_num, vec![text])),
        }
    }

    let width = known_headers.len();
    let rows = blocks
        .iter()
        .filter(|(_, words)| !is_header_line(&words.join(" "), known_headers))
        .map(|(_, words)| fixed_width_row(words.iter().copied(), width))
        .collect();

    RawTable {
        headers: known_headers.to_vec(),
        rows,
    }
}

pub fn parse_tesseract_tsv(tsv: &str) -> Result<Vec<OcrToken>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(tsv.as_bytes());

    let mut tokens = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read TSV row {}", index + 2))?;
        if record.len() != TSV_COLUMNS {
            continue;
        }

        let field = |column: usize| record.get(column).unwrap_or_default();
        let number = |column: usize| -> Result<u32> {
            field(column)
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid number in TSV row {} column {}", index + 2, column + 1))
        };

        if number(0)? != TSV_WORD_LEVEL {
            continue;
        }

        let text = field(11).trim();
        if text.is_empty() {
            continue;
        }

        let confidence = field(10)
            .trim()
            .parse::<f32>()
            .with_context(|| format!("invalid confidence in TSV row {}", index + 2))?;

        tokens.push(OcrToken {
            block_num: number(2)?,
            line_num: number(4)?,
            word_num: number(5)?,
            text: text.to_string(),
            confidence,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::{
        default_headers, parse_tesseract_tsv, positional_headers, tokenize, tokenize_blocks,
    };
    use crate::model::OcrToken;

    #[test]
    fn header_line_is_skipped_and_row_kept() {
        let raw = "खाता संख्या खेवट नाम रकबा फसल\n101 5 रामलाल 2.5 गेहूं";
        let table = tokenize(raw, &default_headers());

        assert_eq!(table.headers, default_headers());
        assert_eq!(
            table.rows,
            vec![vec!["101", "5", "रामलाल", "2.5", "गेहूं"]]
        );
    }

    #[test]
    fn every_row_has_header_width() {
        let raw = "1\n1 2 3 4 5 6 7\n\n   \r\n8 9\r\nअ ब स द य";
        let headers = default_headers();
        let table = tokenize(raw, &headers);

        assert_eq!(table.rows.len(), 4);
        assert!(table.rows.iter().all(|row| row.len() == headers.len()));
        assert_eq!(table.rows[0], vec!["1", "", "", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3", "4", "5"]);
        assert_eq!(table.rows[2], vec!["8", "9", "", "", ""]);
    }

    #[test]
    fn empty_text_yields_headers_without_rows() {
        let table = tokenize("", &default_headers());
        assert_eq!(table.headers.len(), 5);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn data_row_containing_header_word_is_skipped() {
        // "नाम" occurs inside "नामदेव", so the whole line is treated as a header row.
        let table = tokenize("102 7 नामदेव 1.0 चना", &default_headers());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn zero_headers_produce_empty_rows() {
        let table = tokenize("a b c", &[]);
        assert_eq!(table.rows, vec![Vec::<String>::new()]);
    }

    #[test]
    fn positional_headers_are_one_based() {
        assert_eq!(positional_headers(3), vec!["col_1", "col_2", "col_3"]);
    }

    fn token(block_num: u32, text: &str) -> OcrToken {
        OcrToken {
            block_num,
            line_num: 1,
            word_num: 1,
            text: text.to_string(),
            confidence: 90.0,
        }
    }

    #[test]
    fn blocks_group_in_first_appearance_order() {
        let tokens = vec![
            token(3, "101"),
            token(3, "5"),
            token(1, "खाता संख्या"),
            token(3, "रामलाल"),
            token(2, "102"),
            token(2, " "),
        ];
        let headers = positional_headers(3);
        let table = tokenize_blocks(&tokens, &headers);

        assert_eq!(
            table.rows,
            vec![
                vec!["101", "5", "रामलाल"],
                vec!["खाता संख्या", "", ""],
                vec!["102", "", ""],
            ]
        );

        let table = tokenize_blocks(&tokens, &default_headers());
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn tsv_keeps_word_level_tokens() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t\n\
                   5\t1\t2\t1\t1\t1\t10\t10\t40\t20\t91.5\t101\n\
                   5\t1\t2\t1\t1\t2\t60\t10\t40\t20\t88\tरामलाल\n\
                   5\t1\t3\t1\t1\t1\t10\t40\t40\t20\t95\t \n";
        let tokens = parse_tesseract_tsv(tsv).expect("tsv parses");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].block_num, 2);
        assert_eq!(tokens[1].text, "रामलाल");
        assert_eq!(tokens[1].word_num, 2);
        assert!((tokens[0].confidence - 91.5).abs() < f32::EPSILON);
    }

    #[test]
    fn tsv_with_bad_number_is_an_error() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   5\t1\tx\t1\t1\t1\t10\t10\t40\t20\t91\t101\n";
        assert!(parse_tesseract_tsv(tsv).is_err());
    }
}
