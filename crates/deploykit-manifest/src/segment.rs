/// Number of consecutive blank lines that terminates a package block.
pub const BLOCK_SEPARATOR_BLANKS: usize = 3;

/// A run of non-blank lines describing one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock<'a> {
    lines: Vec<&'a str>,
}

impl<'a> RawBlock<'a> {
    pub fn new(lines: Vec<&'a str>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split listing output into blocks separated by runs of three or more blank
/// lines. Shorter blank runs stay inside the current block (the blank lines
/// themselves are not kept), and a long run flushes at most once.
pub fn segment(text: &str) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == BLOCK_SEPARATOR_BLANKS {
                if !current.is_empty() {
                    blocks.push(RawBlock::new(std::mem::take(&mut current)));
                }
                blank_run = 0;
            }
        } else {
            current.push(line);
            blank_run = 0;
        }
    }

    if !current.is_empty() {
        blocks.push(RawBlock::new(current));
    }

    blocks
}
