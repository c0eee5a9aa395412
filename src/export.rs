use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::cli::ExportFormat;
use crate::model::MappedTable;

pub const DEFAULT_FONT_NAME: &str = "Mangal";
pub const DEFAULT_FONT_SIZE: u32 = 12;
pub const DEFAULT_SHEET_TITLE: &str = "Jamabandi Data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetStyle {
    pub font_name: String,
    pub font_size: u32,
    pub sheet_title: String,
}

impl Default for SheetStyle {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
        }
    }
}

pub fn export_table(table: &MappedTable, format: ExportFormat, style: &SheetStyle) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => write_xlsx(table, style),
        ExportFormat::Csv => write_csv(table),
        ExportFormat::Json => {
            let mut data =
                serde_json::to_vec_pretty(table).context("failed to serialize table as json")?;
            data.push(b'\n');
            Ok(data)
        }
    }
}

pub fn write_csv(table: &MappedTable) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer
        .write_record(&table.headers)
        .context("failed to write csv header")?;
    for row in &table.rows {
        writer.write_record(row).context("failed to write csv row")?;
    }
    writer.flush().context("failed to flush csv")?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to finish csv: {}", err.error()))
}

pub fn write_xlsx(table: &MappedTable, style: &SheetStyle) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("xl/workbook.xml", workbook_xml(&style.sheet_title)),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
            ("xl/styles.xml", styles_xml(style)),
            ("xl/worksheets/sheet1.xml", sheet_xml(table)),
        ];

        for (name, body) in parts {
            zip.start_file(name, options)
                .with_context(|| format!("failed to start xlsx part {name}"))?;
            zip.write_all(body.as_bytes())
                .with_context(|| format!("failed to write xlsx part {name}"))?;
        }
        zip.finish().context("failed to finish xlsx archive")?;
    }
    Ok(cursor.into_inner())
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

fn workbook_xml(sheet_title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape_xml(sheet_title)
    )
}

// Font 1 is the document font; every written cell uses xf 1.
fn styles_xml(style: &SheetStyle) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><sz val="{size}"/><name val="{name}"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#,
        size = style.font_size,
        name = escape_xml(&style.font_name)
    )
}

fn sheet_xml(table: &MappedTable) -> String {
    let mut body = String::new();
    let rows = std::iter::once(&table.headers).chain(table.rows.iter());
    for (row_index, row) in rows.enumerate() {
        let row_number = row_index + 1;
        body.push_str(&format!(r#"<row r="{row_number}">"#));
        for (column_index, value) in row.iter().enumerate() {
            body.push_str(&format!(
                r#"<c r="{}{row_number}" t="inlineStr" s="1"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_letters(column_index),
                escape_xml(value)
            ));
        }
        body.push_str("</row>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{body}</sheetData></worksheet>"#
    )
}

pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}
