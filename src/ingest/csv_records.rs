/// Incremental RFC-4180 tokenizer. Text is pushed in arbitrary chunks and complete records
/// come out as soon as their terminating newline has been seen.
#[derive(Debug, Default)]
pub struct CsvRecordBuffer {
    fields: Vec<String>,
    field: String,
    in_quotes: bool,
    quote_pending: bool,
    after_cr: bool,
    touched: bool,
}

impl CsvRecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        for c in chunk.chars() {
            let after_cr = std::mem::take(&mut self.after_cr);

            if self.in_quotes {
                if !self.quote_pending {
                    if c == '"' {
                        self.quote_pending = true;
                    } else {
                        self.field.push(c);
                    }
                    continue;
                }
                self.quote_pending = false;
                if c == '"' {
                    self.field.push('"');
                    continue;
                }
                // Closing quote already consumed; `c` belongs to the unquoted state.
                self.in_quotes = false;
            }

            match c {
                '"' if self.field.is_empty() => {
                    self.in_quotes = true;
                    self.touched = true;
                }
                ',' => {
                    self.end_field();
                    self.touched = true;
                }
                '\n' if after_cr => {}
                '\n' | '\r' => {
                    if let Some(record) = self.end_record() {
                        records.push(record);
                    }
                    self.after_cr = c == '\r';
                }
                _ => {
                    self.field.push(c);
                    self.touched = true;
                }
            }
        }

        records
    }

    /// Emits the trailing record when the input does not end with a newline.
    pub fn finish(&mut self) -> Option<Vec<String>> {
        self.in_quotes = false;
        self.quote_pending = false;
        self.after_cr = false;
        self.end_record()
    }

    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
    }

    fn end_record(&mut self) -> Option<Vec<String>> {
        if !self.touched {
            return None;
        }
        self.end_field();
        self.touched = false;
        Some(std::mem::take(&mut self.fields))
    }
}

/// Tokenizes a whole document, dropping a leading UTF-8 byte order mark and blank lines.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut buffer = CsvRecordBuffer::new();
    let mut records = buffer.push(text);
    if let Some(last) = buffer.finish() {
        records.push(last);
    }
    records
}

/// Renders one record with minimal quoting and a CRLF terminator.
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|field| quote_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
