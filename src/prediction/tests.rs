use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;

use super::*;
use crate::base::clock::ClockMock;
use crate::dict::MemoryDictionary;
use crate::segments::{CandidateSource, Segments};

struct Fixture {
    predictor: UserHistoryPredictor,
    clock: Arc<ClockMock>,
    suppression: Arc<SuppressionDictionary>,
    path: PathBuf,
    _dir: TempDir,
}

fn fixture_with_dictionary(dictionary: MemoryDictionary) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.ktuh");
    let clock = Arc::new(ClockMock::new(1_000_000));
    let suppression = Arc::new(SuppressionDictionary::new());
    let predictor = UserHistoryPredictor::new(
        Arc::new(dictionary),
        Arc::clone(&suppression),
        clock.clone(),
        path.clone(),
    );
    Fixture {
        predictor,
        clock,
        suppression,
        path,
        _dir: dir,
    }
}

fn fixture() -> Fixture {
    fixture_with_dictionary(MemoryDictionary::new())
}

/// Segments holding one committed conversion of (key, value) pairs.
fn committed(pairs: &[(&str, &str)]) -> Segments {
    let mut segments = Segments::new();
    for (key, value) in pairs {
        let segment = segments.add_segment(key);
        segment.add_candidate(crate::segments::Candidate {
            key: key.to_string(),
            value: value.to_string(),
            ..Default::default()
        });
    }
    segments
}

/// Segments asking for prediction of `key`.
fn conversion_request(key: &str) -> Segments {
    let mut segments = Segments::new();
    segments.add_segment(key);
    segments
}

fn candidate_values(segments: &Segments) -> Vec<String> {
    segments.conversion_segments()[0]
        .candidates()
        .iter()
        .map(|c| c.value.clone())
        .collect()
}

fn finish(f: &mut Fixture, pairs: &[(&str, &str)]) {
    let config = Config::default();
    let request = Request::default();
    let mut segments = committed(pairs);
    f.predictor.finish(&config, &request, &mut segments);
}

fn predict(f: &mut Fixture, key: &str) -> Vec<String> {
    let config = Config::default();
    let request = Request::default();
    let mut segments = conversion_request(key);
    f.predictor.predict(&config, &request, &mut segments);
    candidate_values(&segments)
}

#[test]
fn learn_and_predict_exact() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の")]);

    let config = Config::default();
    let request = Request::default();
    let mut segments = conversion_request("わたしの");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    let candidate = segments.conversion_segments()[0].candidate(0).unwrap();
    assert_eq!(candidate.value, "私の");
    assert_eq!(candidate.source, CandidateSource::UserHistoryPredictor);
}

#[test]
fn prefix_prediction() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の")]);
    assert_eq!(predict(&mut f, "わた"), vec!["私の"]);
    assert!(predict(&mut f, "あなた").is_empty());
}

#[test]
fn empty_history_predicts_nothing() {
    let mut f = fixture();
    assert!(predict(&mut f, "わたしの").is_empty());
}

#[test]
fn short_input_needs_frequency() {
    let mut f = fixture();
    finish(&mut f, &[("き", "木")]);
    // One use: a single-char suggestion query is too aggressive.
    assert!(predict(&mut f, "き").is_empty());

    f.clock.put_forward(1, 0);
    finish(&mut f, &[("き", "木")]);
    assert_eq!(predict(&mut f, "き"), vec!["木"]);
}

#[test]
fn prediction_request_bypasses_frequency_gate() {
    let mut f = fixture();
    finish(&mut f, &[("き", "木")]);

    let config = Config::default();
    let mut request = Request::default();
    request.request_type = RequestType::Prediction;
    let mut segments = conversion_request("き");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["木"]);
}

#[test]
fn candidates_ranked_by_recency() {
    let mut f = fixture();
    finish(&mut f, &[("きょうは", "今日は")]);
    f.clock.put_forward(100, 0);
    finish(&mut f, &[("きょうと", "京都")]);

    let values = predict(&mut f, "きょう");
    assert_eq!(values, vec!["京都", "今日は"]);
}

#[test]
fn candidate_cap_respected() {
    let mut f = fixture();
    for (i, pair) in [
        ("きょうは", "今日は"),
        ("きょうの", "今日の"),
        ("きょうも", "今日も"),
        ("きょうこそ", "今日こそ"),
    ]
    .iter()
    .enumerate()
    {
        f.clock.put_forward(i as u64 + 1, 0);
        finish(&mut f, &[*pair]);
    }
    // Request default cap is 3.
    assert_eq!(predict(&mut f, "きょう").len(), 3);
}

#[test]
fn multi_segment_commit_learns_chain_and_sentence() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の"), ("なまえは", "名前は")]);

    // The whole sentence matches an extended input.
    let values = predict(&mut f, "わたしのな");
    assert!(values.contains(&"私の名前は".to_string()));

    // Unigrams were learned too.
    assert!(predict(&mut f, "なまえは").contains(&"名前は".to_string()));
}

#[test]
fn zero_query_suggests_followers() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の"), ("なまえは", "名前は")]);

    let config = Config::default();
    let mut request = Request::default();
    request.zero_query_suggestion = true;

    let mut segments = Segments::new();
    segments.add_history_segment("わたしの", "私の");
    segments.add_segment("");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["名前は"]);
}

#[test]
fn zero_query_disabled_by_request() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の"), ("なまえは", "名前は")]);

    let config = Config::default();
    let request = Request::default();
    let mut segments = Segments::new();
    segments.add_history_segment("わたしの", "私の");
    segments.add_segment("");
    assert!(!f.predictor.predict(&config, &request, &mut segments));
}

#[test]
fn context_boosts_follower() {
    let mut f = fixture();
    // Commit twice so the single-char suggestion gate lets both through.
    finish(&mut f, &[("きょうは", "今日は"), ("はれ", "晴れ")]);
    finish(&mut f, &[("きょうは", "今日は"), ("はれ", "晴れ")]);
    f.clock.put_forward(100, 0);
    finish(&mut f, &[("はんたい", "反対")]);
    finish(&mut f, &[("はんたい", "反対")]);

    // Without context the recent entry wins.
    assert_eq!(predict(&mut f, "は")[0], "反対");

    // After committing 今日は, its follower 晴れ outranks it.
    let config = Config::default();
    let request = Request::default();
    let mut segments = Segments::new();
    segments.add_history_segment("きょうは", "今日は");
    segments.add_segment("は");
    f.predictor.predict(&config, &request, &mut segments);
    assert_eq!(candidate_values(&segments)[0], "晴れ");
}

#[test]
fn punctuation_closes_chain() {
    let mut f = fixture();
    finish(&mut f, &[("きょうは", "今日は"), ("。", "。"), ("あした", "明日")]);

    let config = Config::default();
    let mut request = Request::default();
    request.zero_query_suggestion = true;

    // 今日は links to 。 but 。 must not link on to 明日.
    let mut segments = Segments::new();
    segments.add_history_segment("。", "。");
    segments.add_segment("");
    assert!(!f.predictor.predict(&config, &request, &mut segments));
}

#[test]
fn leading_punctuation_not_learned() {
    let mut f = fixture();
    finish(&mut f, &[("。", "。")]);
    assert_eq!(f.predictor.entries_size(), 0);
}

#[test]
fn expansion_restricts_matches() {
    let mut f = fixture();
    finish(&mut f, &[("かき", "柿")]);
    finish(&mut f, &[("かた", "肩")]);

    let config = Config::default();
    let mut request = Request::default();
    request.request_type = RequestType::Prediction;
    let mut segments = conversion_request("か");
    let alt = vec!["かき".to_string(), "かく".to_string()];
    assert!(f
        .predictor
        .predict_with_expansion(&config, &request, &mut segments, &alt));
    let values = candidate_values(&segments);
    assert!(values.contains(&"柿".to_string()));
    assert!(!values.contains(&"肩".to_string()));
}

#[test]
fn clear_history_entry_tombstones() {
    let mut f = fixture();
    finish(&mut f, &[("きょう", "今日")]);
    assert!(!predict(&mut f, "きょう").is_empty());

    assert!(f.predictor.clear_history_entry("きょう", "今日"));
    assert!(predict(&mut f, "きょう").is_empty());
    // Deleting again finds nothing new.
    assert!(!f.predictor.clear_history_entry("きょう", "今日"));

    // Re-committing revives the entry.
    finish(&mut f, &[("きょう", "今日")]);
    assert_eq!(predict(&mut f, "きょう"), vec!["今日"]);
}

#[test]
fn clear_history_entry_cuts_ngram_chain() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の"), ("なまえは", "名前は")]);
    assert!(predict(&mut f, "わたしのな").contains(&"私の名前は".to_string()));

    assert!(f
        .predictor
        .clear_history_entry("わたしのなまえは", "私の名前は"));

    // The chained completion is gone; the unigrams survive.
    assert!(!predict(&mut f, "わたしのな").contains(&"私の名前は".to_string()));
    assert_eq!(predict(&mut f, "わたしの"), vec!["私の"]);
    assert_eq!(predict(&mut f, "なまえは"), vec!["名前は"]);
}

#[test]
fn clear_all_history() {
    let mut f = fixture();
    finish(&mut f, &[("きょう", "今日")]);
    f.predictor.clear_all_history();
    assert!(predict(&mut f, "きょう").is_empty());
    // Only the event sentinel remains.
    assert_eq!(f.predictor.entries_size(), 1);
}

#[test]
fn clear_unused_history_keeps_used_entries() {
    let mut f = fixture();
    // Learned through suggestion.
    finish(&mut f, &[("きょう", "今日")]);

    // Learned through plain conversion: used too.
    let config = Config::default();
    let mut request = Request::default();
    request.request_type = RequestType::Conversion;
    let mut segments = committed(&[("かいぎ", "会議")]);
    f.predictor.finish(&config, &request, &mut segments);

    // Only an entry with neither frequency is unused; these arrive from
    // history files written before the counters existed.
    let stale = Entry {
        key: "ふるい".to_string(),
        value: "古い".to_string(),
        last_access_time: 1_000_000,
        ..Entry::default()
    };
    f.predictor.dic.insert(entry_fingerprint(&stale), stale);
    assert_eq!(f.predictor.entries_size(), 3);

    f.predictor.clear_unused_history();
    assert_eq!(predict(&mut f, "きょう"), vec!["今日"]);

    request.request_type = RequestType::Prediction;
    let mut segments = conversion_request("かいぎ");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["会議"]);

    let mut segments = conversion_request("ふるい");
    assert!(!f.predictor.predict(&config, &request, &mut segments));
}

#[test]
fn revert_removes_fresh_entry() {
    let mut f = fixture();
    finish(&mut f, &[("きょう", "今日")]);
    f.predictor.revert();
    assert!(predict(&mut f, "きょう").is_empty());
    assert_eq!(f.predictor.entries_size(), 0);
}

#[test]
fn revert_decrements_existing_entry() {
    let mut f = fixture();
    finish(&mut f, &[("き", "木")]);
    finish(&mut f, &[("き", "木")]);
    f.predictor.revert();
    // Back to one use: the single-char gate applies again.
    assert!(predict(&mut f, "き").is_empty());
    assert_eq!(f.predictor.entries_size(), 1);
}

#[test]
fn learning_disabled_levels() {
    let mut f = fixture();
    let mut config = Config::default();
    config.history_learning_level = HistoryLearningLevel::ReadOnly;
    let request = Request::default();
    let mut segments = committed(&[("きょう", "今日")]);
    f.predictor.finish(&config, &request, &mut segments);
    assert_eq!(f.predictor.entries_size(), 0);

    // NoHistory also stops prediction of previously learned entries.
    finish(&mut f, &[("きょう", "今日")]);
    config.history_learning_level = HistoryLearningLevel::NoHistory;
    let mut segments = conversion_request("きょう");
    assert!(!f.predictor.predict(&config, &request, &mut segments));
}

#[test]
fn privacy_bare_numbers_not_learned() {
    let mut f = fixture();
    finish(&mut f, &[("1234", "1234")]);
    assert_eq!(f.predictor.entries_size(), 0);

    // A number the dictionary knows is ordinary text.
    let mut dictionary = MemoryDictionary::new();
    dictionary.add("いちにさんよん", "1234", 3000);
    let mut f = fixture_with_dictionary(dictionary);
    finish(&mut f, &[("1234", "1234")]);
    assert_eq!(f.predictor.entries_size(), 1);
}

#[test]
fn suppressed_entries_never_surface() {
    let mut f = fixture();
    finish(&mut f, &[("きょう", "今日")]);
    f.suppression.add_entry("きょう", "今日");
    assert!(predict(&mut f, "きょう").is_empty());

    f.suppression.clear();
    assert_eq!(predict(&mut f, "きょう"), vec!["今日"]);
}

#[test]
fn roman_fuzzy_recovers_misspelling() {
    let mut f = fixture();
    finish(&mut f, &[("おねがいします", "お願いします")]);

    let config = Config::default();
    let request = Request::default();
    let mut segments = conversion_request("おねがいしまうs");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    let candidate = segments.conversion_segments()[0].candidate(0).unwrap();
    assert_eq!(candidate.value, "お願いします");
    assert_eq!(candidate.description, "もしかして");
}

#[test]
fn kana_input_disables_roman_fuzzy() {
    let mut f = fixture();
    finish(&mut f, &[("おねがいします", "お願いします")]);

    let mut config = Config::default();
    config.preedit_method = PreeditMethod::Kana;
    let request = Request::default();
    let mut segments = conversion_request("おねがいしまうs");
    assert!(!f.predictor.predict(&config, &request, &mut segments));
}

#[test]
fn sync_and_reload() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の")]);
    f.predictor.sync().unwrap();
    f.predictor.wait_for_syncer();

    let mut reloaded = UserHistoryPredictor::new(
        Arc::new(MemoryDictionary::new()),
        Arc::new(SuppressionDictionary::new()),
        f.clock.clone(),
        f.path.clone(),
    );
    let config = Config::default();
    let request = Request::default();
    let mut segments = conversion_request("わたしの");
    assert!(reloaded.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["私の"]);
}

#[test]
fn sync_without_changes_writes_nothing() {
    let mut f = fixture();
    finish(&mut f, &[("わたしの", "私の")]);
    f.predictor.sync().unwrap();
    f.predictor.wait_for_syncer();

    std::fs::remove_file(&f.path).unwrap();
    f.predictor.sync().unwrap();
    f.predictor.wait_for_syncer();
    assert!(!f.path.exists());
}

#[test]
fn stale_entries_pruned_at_sync() {
    let mut f = fixture();
    finish(&mut f, &[("ふるい", "古い")]);
    // 63 days later, commit something new and sync.
    f.clock.put_forward(63 * 24 * 60 * 60, 0);
    finish(&mut f, &[("あたらしい", "新しい")]);
    f.predictor.sync().unwrap();
    f.predictor.wait_for_syncer();

    assert!(predict(&mut f, "ふるい").is_empty());
    assert_eq!(predict(&mut f, "あたらしい"), vec!["新しい"]);
}

#[test]
fn tombstones_survive_reload() {
    let mut f = fixture();
    finish(&mut f, &[("きょう", "今日")]);
    f.predictor.clear_history_entry("きょう", "今日");
    f.predictor.sync().unwrap();
    f.predictor.wait_for_syncer();

    let mut reloaded = UserHistoryPredictor::new(
        Arc::new(MemoryDictionary::new()),
        Arc::new(SuppressionDictionary::new()),
        f.clock.clone(),
        f.path.clone(),
    );
    let config = Config::default();
    let request = Request::default();
    let mut segments = conversion_request("きょう");
    assert!(!reloaded.predict(&config, &request, &mut segments));
}

#[test]
fn match_type_cases() {
    assert_eq!(get_match_type("あい", "あい"), MatchType::Exact);
    assert_eq!(get_match_type("あ", "あい"), MatchType::LeftPrefix);
    assert_eq!(get_match_type("あい", "あ"), MatchType::RightPrefix);
    assert_eq!(get_match_type("あい", "うえ"), MatchType::NoMatch);
    assert_eq!(get_match_type("", "あい"), MatchType::NoMatch);
    assert_eq!(get_match_type("あい", ""), MatchType::NoMatch);
}

#[test]
fn maybe_roman_misspelled_cases() {
    assert!(maybe_roman_misspelled_key("おねがいしまうs"));
    assert!(maybe_roman_misspelled_key("onegaisimasu"));
    assert!(maybe_roman_misspelled_key("ぐーぐるh"));
    assert!(!maybe_roman_misspelled_key("おねがいします"));
    assert!(!maybe_roman_misspelled_key("おねがいsします"));

    // Two stray ASCII chars: no longer a plausible single typo.
    assert!(!maybe_roman_misspelled_key("おねがsいしまうs"));
    // Unknown script mixed in.
    assert!(!maybe_roman_misspelled_key("お願いしまうs"));
}

#[test]
fn roman_fuzzy_prefix_match_cases() {
    // Transposed neighbors.
    assert!(roman_fuzzy_prefix_match("onegaisimasu", "onegaisimaus"));
    // One dropped char.
    assert!(roman_fuzzy_prefix_match("desu", "dsu"));
    // Typo over a prolonged sound mark.
    assert!(roman_fuzzy_prefix_match("gu-guru", "guxguru"));

    // Exact strings and exact prefixes need no correction.
    assert!(!roman_fuzzy_prefix_match("onegaisimasu", "onegaisimasu"));
    assert!(!roman_fuzzy_prefix_match("onegaisimasu", "onegai"));

    // More than one typo.
    assert!(!roman_fuzzy_prefix_match("onegaisimasu", "oneagisimaus"));
    // Prefix longer than the target.
    assert!(!roman_fuzzy_prefix_match("abc", "abcd"));
    assert!(!roman_fuzzy_prefix_match("abc", ""));
}

proptest! {
    #[test]
    fn fuzzy_match_is_irreflexive(s in "[a-z-]{0,16}") {
        prop_assert!(!roman_fuzzy_prefix_match(&s, &s));
    }

    #[test]
    fn fingerprint_stable(key in "\\PC{0,8}", value in "\\PC{0,8}") {
        prop_assert_eq!(fingerprint(&key, &value), fingerprint(&key, &value));
    }
}

#[test]
fn zero_query_commit_counted_not_learned() {
    let mut f = fixture();
    assert_eq!(f.predictor.num_zero_query_commits(), 0);

    // Committed from a zero-query suggestion: no reading attached.
    finish(&mut f, &[("", "明日")]);
    assert_eq!(f.predictor.num_zero_query_commits(), 1);
    assert_eq!(f.predictor.entries_size(), 0);

    finish(&mut f, &[("あした", "明日")]);
    assert_eq!(f.predictor.num_zero_query_commits(), 1);
    assert_eq!(f.predictor.entries_size(), 1);
}

#[test]
fn mixed_conversion_suggests_from_first_key() {
    let mut f = fixture();
    finish(&mut f, &[("き", "木")]);
    // A single use fails the short-input gate on a plain suggestion.
    assert!(predict(&mut f, "き").is_empty());

    let config = Config::default();
    let mut request = Request::default();
    request.mixed_conversion = true;
    let mut segments = conversion_request("き");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["木"]);
}

#[test]
fn kana_modifier_insensitive_prefix_lookup() {
    let mut f = fixture();
    finish(&mut f, &[("ばなな", "バナナ")]);

    let config = Config::default();
    let mut request = Request::default();
    request.request_type = RequestType::Prediction;

    // The unvoiced prefix a 12-key host emits before the modifier tap.
    let mut segments = conversion_request("はな");
    assert!(!f.predictor.predict(&config, &request, &mut segments));

    request.kana_modifier_insensitive_conversion = true;
    let mut segments = conversion_request("はな");
    assert!(f.predictor.predict(&config, &request, &mut segments));
    assert_eq!(candidate_values(&segments), vec!["バナナ"]);
}

#[test]
fn private_use_values_never_surface() {
    let mut f = fixture();
    finish(&mut f, &[("てすと", "\u{F001}テスト")]);
    assert_eq!(f.predictor.entries_size(), 1);
    assert!(predict(&mut f, "てすと").is_empty());
}
