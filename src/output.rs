//! Terminal output for the `postings` and `doc` commands

use crate::codec::Codec;
use crate::document::StoredDocument;
use crate::index::types::{Posting, TermId};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout stream honouring the `color` switch
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn codec_name(codec: Codec) -> &'static str {
    match codec {
        Codec::Plain => "plain",
        Codec::VByte => "vbyte",
        Codec::Gamma => "gamma",
    }
}

/// Print a posting list: a header line, then `docId<TAB>frequency` per posting
pub fn print_postings<W: WriteColor>(
    out: &mut W,
    term: &str,
    term_id: TermId,
    codec: Codec,
    postings: &[Posting],
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", term)?;
    out.reset()?;
    writeln!(
        out,
        " (term {}, df {}, {})",
        term_id,
        postings.len(),
        codec_name(codec)
    )?;

    for posting in postings {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", posting.doc_id)?;
        out.reset()?;
        writeln!(out, "\t{}", posting.frequency)?;
    }

    Ok(())
}

/// Print a stored document's metadata and the start of its token stream
pub fn print_document<W: WriteColor>(
    out: &mut W,
    doc: &StoredDocument,
    preview: usize,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(out, "{}", doc.name)?;
    out.reset()?;

    writeln!(out, "Document id:      {}", doc.doc_id)?;
    writeln!(out, "Tokens:           {}", doc.num_tokens)?;

    if !doc.tokens.is_empty() {
        let shown = doc.tokens.len().min(preview);
        write!(out, "Preview:          {}", doc.tokens[..shown].join(" "))?;
        if shown < doc.tokens.len() {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            write!(out, " ...")?;
            out.reset()?;
        }
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn test_print_postings() {
        let mut buf = Buffer::no_color();
        let postings = vec![Posting::new(0, 1), Posting::new(1, 2)];
        print_postings(&mut buf, "the", 0, Codec::Gamma, &postings).unwrap();

        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert_eq!(text, "the (term 0, df 2, gamma)\n0\t1\n1\t2\n");
    }

    #[test]
    fn test_print_document_preview() {
        let doc = StoredDocument {
            doc_id: 3,
            name: "a.txt".into(),
            num_tokens: 3,
            tokens: vec!["the".into(), "cat".into(), "sat".into()],
        };
        let mut buf = Buffer::no_color();
        print_document(&mut buf, &doc, 2).unwrap();

        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.starts_with("a.txt\n"));
        assert!(text.contains("Tokens:           3\n"));
        assert!(text.contains("Preview:          the cat ...\n"));
    }
}
