//! Message correction and chunking shared by every channel.
//!
//! Upstream text sometimes arrives with a stray leading `n` (left over from
//! an escaped newline) and a trailing backslash that would escape the
//! closing delimiter of a code fence. [`correct`] strips one of each.
//!
//! Correction is applied exactly once per message, before chunking. It is
//! deliberately lossy: a message whose real content starts with `n` or ends
//! with `\` loses that character, and running [`correct`] a second time
//! strips another one.

/// Remove a single leading `n` and a single trailing `\`, if present.
pub fn correct(raw: &str) -> String {
    let text = raw.strip_prefix('n').unwrap_or(raw);
    let text = text.strip_suffix('\\').unwrap_or(text);
    text.to_string()
}

/// Correct `message` and cut it into chunks of at most `max_chunk_size`
/// characters.
///
/// Every chunk except the last is exactly `max_chunk_size` characters long
/// and the chunks concatenate back to `correct(message)`. A message shorter
/// than the limit yields itself as the only chunk. A limit of zero is
/// treated as one.
pub fn split(message: &str, max_chunk_size: usize) -> Vec<String> {
    chunk(&correct(message), max_chunk_size)
}

/// Cut already-corrected text into chunks without correcting it again.
///
/// Lengths are counted in characters, so a chunk never ends inside a
/// multi-byte code point.
pub fn chunk(text: &str, max_chunk_size: usize) -> Vec<String> {
    let max = max_chunk_size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max + 1);
    let mut rest = text;

    // `boundary` is always > 0, so `rest` shrinks on every iteration.
    while let Some((boundary, _)) = rest.char_indices().nth(max) {
        let (head, tail) = rest.split_at(boundary);
        chunks.push(head.to_string());
        rest = tail;
    }
    chunks.push(rest.to_string());

    chunks
}
