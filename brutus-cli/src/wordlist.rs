use std::path::Path;

use tokio::fs;

use crate::error::Error;

/// Read a word list, one candidate per line.
///
/// Line terminators are kept; the engine strips them before hashing. A final
/// line without a terminator is kept as is. Lines that are not valid UTF-8
/// are skipped, so word indices count only the lines that were kept.
pub async fn load_word_list(path: &Path) -> Result<Vec<String>, Error> {
    let contents = fs::read(path)
        .await
        .map_err(|source| Error::WordList { path: path.to_path_buf(), source })?;

    let mut skipped = 0usize;
    let words: Vec<String> = contents
        .split_inclusive(|&b| b == b'\n')
        .filter_map(|line| match std::str::from_utf8(line) {
            Ok(word) => Some(word.to_owned()),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped,
            kept = words.len(),
            "skipped word-list lines that are not valid UTF-8"
        );
    }
    Ok(words)
}
