//! FETCH command handler (sequence numbers, not UIDs).
//!
//! Each requested message is returned as a `BODY[]` counted literal:
//!
//! ```text
//! * <seq> FETCH (BODY[] {<length>}
//! <exactly length bytes of raw RFC 5322 message>
//! )
//! ```
//!
//! The client asks for `BODY.PEEK[]`; the response names the section
//! `BODY[]` either way, and since the folder is read-only no flag
//! changes.

use crate::fake_imap::io::{fetch_literal, tagged};
use crate::fake_imap::mailbox::Mailbox;
use imap_codec::imap_types::sequence::{SeqOrUid, Sequence, SequenceSet};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Sequence numbers named in `seq_set`. Only single values are
/// supported, which is all the client sends.
fn sequence_numbers(seq_set: &SequenceSet) -> Vec<u32> {
    seq_set
        .0
        .as_ref()
        .iter()
        .filter_map(|seq| match seq {
            Sequence::Single(SeqOrUid::Value(v)) => Some(v.get()),
            _ => None,
        })
        .collect()
}

pub async fn handle_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    sequence_set: &SequenceSet,
    mailbox: &Mailbox,
    open_folder: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = open_folder.and_then(|name| mailbox.get_folder(name)) else {
        let _ = tagged(stream, tag, "BAD No folder open").await;
        return;
    };

    for seq in sequence_numbers(sequence_set) {
        let Some(raw) = folder.message(seq) else {
            let _ = tagged(stream, tag, "BAD Invalid sequence number").await;
            return;
        };
        if fetch_literal(stream, seq, raw).await.is_err() {
            return;
        }
    }

    let _ = tagged(stream, tag, "OK FETCH completed").await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::capture::{duplex, output};
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::num::NonZeroU32;

    fn seq(n: u32) -> SequenceSet {
        SequenceSet(
            vec![Sequence::Single(SeqOrUid::Value(NonZeroU32::new(n).unwrap()))]
                .try_into()
                .unwrap(),
        )
    }

    fn mailbox() -> Mailbox {
        MailboxBuilder::new()
            .folder("INBOX")
            .message(b"Subject: first\r\n\r\nOne")
            .message(b"Subject: second\r\n\r\nTwo")
            .build()
    }

    async fn run(tag: &str, set: &SequenceSet, open: Option<&str>) -> String {
        let (client, mut stream) = duplex();
        handle_fetch(tag, set, &mailbox(), open, &mut stream).await;
        output(stream, client).await
    }

    #[tokio::test]
    async fn returns_message_at_sequence_number() {
        let out = run("A1", &seq(2), Some("INBOX")).await;

        assert!(out.starts_with("* 2 FETCH (BODY[] {"));
        assert!(out.contains("Subject: second"));
        assert!(!out.contains("Subject: first"));
        assert!(out.ends_with(")\r\nA1 OK FETCH completed\r\n"));
    }

    #[tokio::test]
    async fn literal_length_matches_message() {
        let raw = b"Subject: first\r\n\r\nOne";
        let out = run("A1", &seq(1), Some("INBOX")).await;
        assert!(out.contains(&format!("{{{}}}\r\n", raw.len())));
    }

    #[tokio::test]
    async fn out_of_range_is_bad() {
        let out = run("A1", &seq(3), Some("INBOX")).await;
        assert_eq!(out, "A1 BAD Invalid sequence number\r\n");
    }

    #[tokio::test]
    async fn requires_open_folder() {
        let out = run("A1", &seq(1), None).await;
        assert_eq!(out, "A1 BAD No folder open\r\n");
    }
}
