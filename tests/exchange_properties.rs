use rand::SeedableRng;
use rand::rngs::StdRng;

use threadlab_grader::bench::{
    FortuneCorpus, GeneratorConfig, ParseError, WorkloadGenerator, compare, compute_expected,
    first_mismatch, parse_subject_output, parse_workload,
};
use threadlab_grader::core_types::{MAX_PAYLOAD_CHARS, Message, Workload};

const CLIENTS: u32 = 5;

/// Helper: seeded workload over the builtin corpus
fn generated(seed: u64, messages: usize) -> Workload {
    let corpus = FortuneCorpus::builtin();
    let config = GeneratorConfig {
        client_count: CLIENTS,
        message_count: messages,
    };
    WorkloadGenerator::new(config, StdRng::seed_from_u64(seed), &corpus)
        .unwrap()
        .generate()
}

/// Helper: what a correct subject prints, in workload order
fn perfect_echo(workload: &Workload) -> Vec<String> {
    workload
        .messages()
        .iter()
        .map(|m| format!("{}: {}", m.destination, m.payload))
        .collect()
}

/// Helper: seeded workload over entries shaped like real fortune files
fn generated_from_messy_corpus(seed: u64, messages: usize) -> Workload {
    let corpus = messy_corpus();
    let config = GeneratorConfig {
        client_count: CLIENTS,
        message_count: messages,
    };
    WorkloadGenerator::new(config, StdRng::seed_from_u64(seed), &corpus)
        .unwrap()
        .generate()
}

fn messy_corpus() -> FortuneCorpus {
    let long_tail = format!("{}   ", "w".repeat(MAX_PAYLOAD_CHARS - 1));
    let long_gap = format!("{} {}", "v".repeat(MAX_PAYLOAD_CHARS - 1), "after the cut");
    let long_wide = format!("{}\t\t", "ü".repeat(1200));
    FortuneCorpus::from_entries([
        "\tindented fortune".to_string(),
        "trailing  ".to_string(),
        "  both ends  ".to_string(),
        "key: value\r\nnext line".to_string(),
        "ratio 3:2:1".to_string(),
        "dos line\r\n".to_string(),
        "\n\nblank lines first".to_string(),
        long_tail,
        long_gap,
        long_wide,
    ])
    .unwrap()
}

fn verdict(workload: &Workload, lines: &[String]) -> bool {
    let expected = compute_expected(workload, CLIENTS);
    let mut stdout = lines.join("\n");
    stdout.push('\n');
    let actual = parse_subject_output(&stdout, CLIENTS).unwrap();
    compare(&expected, &actual)
}

#[test]
fn perfect_echo_always_matches_oracle() {
    for seed in 0..20 {
        let workload = generated(seed, 200);
        assert!(verdict(&workload, &perfect_echo(&workload)), "seed {seed}");
    }
}

#[test]
fn delivery_order_does_not_matter() {
    let workload = generated(7, 300);
    let mut lines = perfect_echo(&workload);
    lines.reverse();
    assert!(verdict(&workload, &lines));

    // interleave: odd positions first, then even
    let lines = perfect_echo(&workload);
    let shuffled: Vec<String> = lines
        .iter()
        .skip(1)
        .step_by(2)
        .chain(lines.iter().step_by(2))
        .cloned()
        .collect();
    assert!(verdict(&workload, &shuffled));
}

#[test]
fn dropped_duplicated_or_substituted_payload_is_caught() {
    let workload = generated(11, 100);
    let lines = perfect_echo(&workload);

    let mut dropped = lines.clone();
    dropped.remove(42);
    assert!(!verdict(&workload, &dropped));

    let mut duplicated = lines.clone();
    duplicated.push(lines[17].clone());
    assert!(!verdict(&workload, &duplicated));

    let mut substituted = lines.clone();
    let dest = workload.messages()[3].destination;
    substituted[3] = format!("{}: not what was sent", dest);
    assert!(!verdict(&workload, &substituted));

    // right payload, wrong destination
    let mut misrouted = lines.clone();
    let m = &workload.messages()[5];
    let wrong = m.destination % CLIENTS + 1;
    misrouted[5] = format!("{}: {}", wrong, m.payload);
    assert!(!verdict(&workload, &misrouted));
}

#[test]
fn mismatch_names_the_client() {
    let workload = parse_workload("1 2 a\n1 2 b\n2 3 c\n", CLIENTS).unwrap();
    let expected = compute_expected(&workload, CLIENTS);
    let actual = parse_subject_output("2: a\n3: c\n", CLIENTS).unwrap();

    let mismatch = first_mismatch(&expected, &actual).unwrap();
    assert_eq!(
        mismatch.to_string(),
        "client 2 should receive 2 messages but received 1"
    );
}

#[test]
fn truncation_boundary() {
    let at_limit = "x".repeat(MAX_PAYLOAD_CHARS);
    let over = "y".repeat(MAX_PAYLOAD_CHARS + 1);

    assert_eq!(Message::new(1, 2, &at_limit).payload, at_limit);
    assert_eq!(
        Message::new(1, 2, &over).payload,
        "y".repeat(MAX_PAYLOAD_CHARS)
    );

    // characters, not bytes
    let wide = "é".repeat(MAX_PAYLOAD_CHARS + 3);
    assert_eq!(
        Message::new(1, 2, &wide).payload.chars().count(),
        MAX_PAYLOAD_CHARS
    );
}

#[test]
fn truncated_payload_round_trips() {
    let workload = Workload::new(vec![Message::new(3, 1, &"z".repeat(1500))]);
    let text = workload.to_file_contents();
    let reparsed = parse_workload(&text, CLIENTS).unwrap();
    assert_eq!(reparsed, workload);
    assert!(verdict(&reparsed, &perfect_echo(&reparsed)));
}

#[test]
fn self_messages_land_in_own_bucket() {
    let workload = parse_workload("3 3 note to self\n1 3 hello\n", CLIENTS).unwrap();
    let expected = compute_expected(&workload, CLIENTS);
    assert_eq!(expected.bucket(3), ["hello", "note to self"]);
    assert!(expected.bucket(1).is_empty());
}

#[test]
fn generator_produces_self_messages() {
    let workload = generated(3, 500);
    assert!(
        workload
            .messages()
            .iter()
            .any(|m| m.source == m.destination)
    );
}

#[test]
fn malformed_output_line_is_rejected() {
    let err = parse_subject_output("1: fine\nno delimiter here\n", CLIENTS).unwrap_err();
    assert_eq!(
        err,
        ParseError::MalformedOutputLine {
            line: 2,
            reason: "missing ':' delimiter".to_string(),
            text: "no delimiter here".to_string(),
        }
    );
}

#[test]
fn seeded_generation_is_byte_identical() {
    let a = generated(99, 400).to_file_contents();
    let b = generated(99, 400).to_file_contents();
    let c = generated(100, 400).to_file_contents();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn messy_corpus_perfect_echo_matches_oracle() {
    for seed in 0..30 {
        let workload = generated_from_messy_corpus(seed, 150);
        assert!(verdict(&workload, &perfect_echo(&workload)), "seed {seed}");
    }
}

#[test]
fn messy_corpus_payloads_are_wire_safe() {
    let workload = generated_from_messy_corpus(5, 400);
    for m in workload.messages() {
        assert!(m.payload.chars().count() <= MAX_PAYLOAD_CHARS);
        assert!(!m.payload.contains(':'), "{:?}", m.payload);
        assert!(!m.payload.contains('\n') && !m.payload.contains('\r'));
        assert_eq!(m.payload, m.payload.trim());
        assert!(!m.payload.is_empty());
    }
    // every corpus shape is drawn at 400 messages over 10 entries
    assert!(workload.messages().iter().any(|m| m.payload == "indented fortune"));
    assert!(
        workload
            .messages()
            .iter()
            .any(|m| m.payload == "w".repeat(MAX_PAYLOAD_CHARS - 1))
    );
}

#[test]
fn messy_corpus_file_round_trips() {
    let workload = generated_from_messy_corpus(21, 250);
    let reparsed = parse_workload(&workload.to_file_contents(), CLIENTS).unwrap();
    assert_eq!(reparsed, workload);
    assert!(verdict(&reparsed, &perfect_echo(&reparsed)));
}

#[test]
fn fortune_file_with_padding_round_trips() {
    let text = "  leading spaces\r\n%\r\nQ: why?\r\nA: because.   \r\n%\r\n\ttabbed\t\r\n";
    let corpus = FortuneCorpus::parse(text).unwrap();
    assert_eq!(corpus.len(), 3);

    let config = GeneratorConfig {
        client_count: CLIENTS,
        message_count: 60,
    };
    let workload = WorkloadGenerator::new(config, StdRng::seed_from_u64(8), &corpus)
        .unwrap()
        .generate();
    let reparsed = parse_workload(&workload.to_file_contents(), CLIENTS).unwrap();
    assert_eq!(reparsed, workload);
    assert!(verdict(&reparsed, &perfect_echo(&reparsed)));
    assert!(
        workload
            .messages()
            .iter()
            .all(|m| ["leading spaces", "Q- why? A- because.", "tabbed"].contains(&m.payload.as_str()))
    );
}
