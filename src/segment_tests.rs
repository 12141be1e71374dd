use super::*;
use std::io::Write;

fn detect_all(text: &str) -> Vec<String> {
    let mut detector = SentenceDetector::new();
    let mut sentences = Vec::new();
    for c in text.chars() {
        if let Some(sentence) = detector.push(c).expect("push character") {
            sentences.push(sentence);
        }
    }
    if let Some(sentence) = detector.finish().expect("finish input") {
        sentences.push(sentence);
    }
    sentences
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

const WELL_FORMED: [&str; 5] = [
    "Sentence1 is first.",
    "Is sentence2 second ?",
    "Sentence3 is next ...",
    "Test's is processed.",
    "This is a unit-test.",
];

const NEWLINE_JOINED: [&str; 6] = [
    "Sentence1 is first\n",
    "Is sentence2 second ?",
    "Sentence3 is next\n\n",
    "Test's is processed.",
    "Sentence3 is next\n\n",
    "Test's is processed...",
];

#[test]
fn detector_splits_space_joined_sentences() {
    let text = WELL_FORMED.join(" ");
    assert_eq!(detect_all(&text), WELL_FORMED);
}

#[test]
fn newlines_without_terminator_continue_the_sentence() {
    let text = NEWLINE_JOINED.join(" ");
    assert_eq!(
        detect_all(&text),
        [
            "Sentence1 is first Is sentence2 second ?",
            "Sentence3 is next Test's is processed.",
            "Sentence3 is next Test's is processed...",
        ]
    );
}

#[test]
fn newline_mid_sentence_collapses_to_single_space() {
    let sentences = split_sentences("Sentence1 is first\n Is sentence2 second ?").expect("split");
    assert_eq!(sentences, ["Sentence1 is first Is sentence2 second ?"]);
}

#[test]
fn single_dot_closes_without_whitespace() {
    let sentences = split_sentences("One.Two.").expect("split");
    assert_eq!(sentences, ["One.", "Two."]);
}

#[test]
fn two_dots_mid_text_is_a_fault() {
    let err = split_sentences("Test..middle").expect_err("two dots must fail");
    match err {
        WhisperError::Segmentation {
            offset,
            character,
            dots,
        } => {
            assert_eq!(dots, 2);
            assert_eq!(character, Some('m'));
            assert_eq!(offset, 6);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn two_dots_at_end_of_input_is_a_fault() {
    let err = split_sentences("This is a test.\n.").expect_err("dangling dots must fail");
    assert!(matches!(
        err,
        WhisperError::Segmentation {
            character: None,
            dots: 2,
            ..
        }
    ));
}

#[test]
fn trailing_ellipsis_split_by_newline_is_one_run() {
    let sentences = split_sentences("This is a test..\n.").expect("split");
    assert_eq!(sentences, ["This is a test..."]);
}

#[test]
fn four_dots_is_a_fault() {
    assert!(split_sentences("Wait.... what").is_err());
}

#[test]
fn residual_text_without_terminator_is_emitted() {
    let sentences = split_sentences("First one. and a tail").expect("split");
    assert_eq!(sentences, ["First one.", "and a tail"]);
}

#[test]
fn blank_input_yields_nothing() {
    assert!(split_sentences("  \n\n ").expect("split").is_empty());
    assert!(split_sentences("").expect("split").is_empty());
}

#[test]
fn question_after_dots_leaves_an_empty_sentence() {
    let sentences = split_sentences("Really.? Yes.").expect("split");
    assert_eq!(sentences, ["Really.?", "", "Yes."]);
}

#[test]
fn file_and_string_segment_identically() {
    let text = NEWLINE_JOINED.join("\n");
    let file = write_temp(&text);
    let from_file: Vec<String> = sentences_from_file(file.path())
        .expect("open file")
        .collect::<Result<_>>()
        .expect("segment file");
    let from_str = split_sentences(&text).expect("segment string");
    assert_eq!(from_file, from_str);
    assert_eq!(from_file.len(), 3);
}

#[test]
fn file_with_blank_lines_between_sentences() {
    let text = WELL_FORMED.join("\n\n") + "\n";
    let file = write_temp(&text);
    let sentences: Vec<String> = sentences_from_file(file.path())
        .expect("open file")
        .collect::<Result<_>>()
        .expect("segment file");
    assert_eq!(sentences, WELL_FORMED);
}

#[test]
fn crlf_file_segments_like_lf() {
    let file = write_temp(&(WELL_FORMED.join("\r\n") + "\r\n"));
    let sentences: Vec<String> = sentences_from_file(file.path())
        .expect("open file")
        .collect::<Result<_>>()
        .expect("segment file");
    assert_eq!(sentences, WELL_FORMED);
    assert_eq!(
        split_sentences("Hello there.\r\nWorld.\r\n").expect("segment string"),
        ["Hello there.", "World."]
    );
}

#[test]
fn non_ascii_file_is_an_encoding_fault() {
    let file = write_temp("Caf\u{e9} ouvert.");
    let err = read_ascii(file.path()).expect_err("non-ascii must fail");
    assert!(matches!(
        err,
        WhisperError::Encoding {
            offset: 3,
            byte: 0xc3
        }
    ));
}

#[test]
fn sentence_iterator_stops_after_fault() {
    let mut sentences = sentences_from_str("Ok. Bad.. tail");
    assert_eq!(sentences.next().expect("first").expect("ok"), "Ok.");
    assert!(sentences.next().expect("second").is_err());
    assert!(sentences.next().is_none());
}
