//! Documents as the pipeline sees them: headings, paragraphs of sentences
//! and tables, all already split and tokenized.
//!
//! Reading files and splitting sentences belong to the caller.
//! [`Document::from_text`] covers the simple case used in tests: one
//! sentence per line, paragraphs separated by blank lines, and `#` lines as
//! headings.

use layered_extract::{create_stream_from_string, Tagger, TokenStream};

use crate::position::Position;

/// A table whose first column holds the row headers.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub caption: Option<TokenStream>,
    pub header: Vec<TokenStream>,
    pub rows: Vec<Vec<TokenStream>>,
}

impl Table {
    pub fn from_text(caption: Option<&str>, header: &[&str], rows: &[&[&str]]) -> Self {
        Table {
            caption: caption.map(create_stream_from_string),
            header: header.iter().map(|text| create_stream_from_string(text)).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|text| create_stream_from_string(text)).collect())
                .collect(),
        }
    }

    /// One stream per data cell: column header, then row header, then the
    /// cell itself. Paired with the cell's row index. Single-column tables
    /// have no row headers.
    pub fn cell_streams(&self) -> Vec<(usize, TokenStream)> {
        let empty = TokenStream::default();
        let mut cells = Vec::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            let (row_header, first_column) = match row.len() {
                1 => (&empty, 0),
                _ => (row.first().unwrap_or(&empty), 1),
            };
            for (column, cell) in row.iter().enumerate().skip(first_column) {
                if cell.is_empty() {
                    continue;
                }
                let header = self.header.get(column).unwrap_or(&empty);
                cells.push((row_idx, header.concat(row_header).concat(cell)));
            }
        }
        cells
    }

    fn streams_mut(&mut self) -> impl Iterator<Item = &mut TokenStream> {
        self.caption
            .iter_mut()
            .chain(self.header.iter_mut())
            .chain(self.rows.iter_mut().flatten())
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Heading(TokenStream),
    Paragraph(Vec<TokenStream>),
    Table(Table),
}

/// A sequence of blocks. Every heading opens a new section.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from plain text: `#` lines are headings, blank
    /// lines end paragraphs and every other line is one sentence.
    pub fn from_text(text: &str) -> Self {
        let mut document = Document::new();
        let mut sentences = Vec::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                if !sentences.is_empty() {
                    document.push(Block::Paragraph(std::mem::take(&mut sentences)));
                }
                if let Some(heading) = line.strip_prefix('#') {
                    let heading = heading.trim_start_matches('#').trim();
                    document.push(Block::Heading(create_stream_from_string(heading)));
                }
                continue;
            }
            sentences.push(create_stream_from_string(line));
        }
        if !sentences.is_empty() {
            document.push(Block::Paragraph(sentences));
        }
        document
    }

    pub fn heading(mut self, text: &str) -> Self {
        self.push(Block::Heading(create_stream_from_string(text)));
        self
    }

    pub fn paragraph<'a>(mut self, sentences: impl IntoIterator<Item = &'a str>) -> Self {
        self.push(Block::Paragraph(
            sentences.into_iter().map(create_stream_from_string).collect(),
        ));
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.push(Block::Table(table));
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Tag every stream of the document, table cells included.
    pub fn apply_tagger(&mut self, tagger: &dyn Tagger) {
        for block in &mut self.blocks {
            match block {
                Block::Heading(stream) => stream.apply_tagger(tagger),
                Block::Paragraph(sentences) => sentences.iter_mut().for_each(|stream| stream.apply_tagger(tagger)),
                Block::Table(table) => table.streams_mut().for_each(|stream| stream.apply_tagger(tagger)),
            }
        }
    }

    /// Blocks with the section and paragraph they open.
    fn positioned(&self) -> impl Iterator<Item = (usize, usize, &Block)> {
        let mut section = 0;
        self.blocks.iter().enumerate().map(move |(paragraph, block)| {
            if matches!(block, Block::Heading(_)) && paragraph > 0 {
                section += 1;
            }
            (section, paragraph, block)
        })
    }

    /// Headings, paragraph sentences and table captions, in document order.
    pub fn sentences(&self) -> Vec<(Position, &TokenStream)> {
        let mut sentences = Vec::new();
        for (section, paragraph, block) in self.positioned() {
            match block {
                Block::Heading(stream) => sentences.push((Position::new(section, paragraph, 0), stream)),
                Block::Paragraph(streams) => sentences.extend(
                    streams
                        .iter()
                        .enumerate()
                        .map(|(sentence, stream)| (Position::new(section, paragraph, sentence), stream)),
                ),
                Block::Table(table) => {
                    if let Some(caption) = &table.caption {
                        sentences.push((Position::new(section, paragraph, 0), caption));
                    }
                }
            }
        }
        sentences
    }

    /// Cell streams of every table. Row `n` of a table sits at sentence
    /// `n + 1`, after the caption.
    pub fn table_cells(&self) -> Vec<(Position, TokenStream)> {
        let mut cells = Vec::new();
        for (section, paragraph, block) in self.positioned() {
            if let Block::Table(table) = block {
                cells.extend(
                    table
                        .cell_streams()
                        .into_iter()
                        .map(|(row, stream)| (Position::new(section, paragraph, row + 1), stream)),
                );
            }
        }
        cells
    }
}
