//! Test registry - all test cases are registered here

pub mod helpers;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Tests are grouped by category. Each test:
/// 1. Queues a mock backend response (what the generation service would return)
/// 2. Sends a request to the REAL relay
/// 3. Validates the response
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        (@case $name:expr, $desc:expr, $func:path, $needs_bin:expr) => {
            TestCase {
                name: $name,
                description: $desc,
                needs_relay_bin: $needs_bin,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
        (spawns $name:literal, $desc:expr, $func:path) => {
            test!(@case $name, $desc, $func, true)
        };
        ($name:expr, $desc:expr, $func:path) => {
            test!(@case $name, $desc, $func, false)
        };
    }

    vec![
        // ── Basic behavior ────────────────────────────────────────────────────
        test!(
            "basic/hello_round_trip",
            "Message without history returns reply plus two-turn history",
            basic::test_hello_round_trip
        ),
        test!(
            "basic/history_preserved",
            "Prior turns are kept in order ahead of the new exchange",
            basic::test_history_preserved
        ),
        test!(
            "basic/prompt_formatting",
            "Backend receives the flattened User:/Assistant: prompt",
            basic::test_prompt_formatting
        ),
        test!(
            "basic/generation_parameters",
            "Default sampling parameters are sent; request overrides win",
            basic::test_generation_parameters
        ),
        test!(
            "basic/cors_headers",
            "CORS headers are present on relay responses",
            basic::test_cors_headers
        ),
        test!(
            "basic/preflight",
            "OPTIONS preflight answers 200 without a backend call",
            basic::test_preflight
        ),
        test!("basic/health", "/health answers OK", basic::test_health),
        test!(
            "basic/bearer_auth",
            "Configured API key reaches the backend as a bearer token",
            basic::test_bearer_auth_forwarded
        ),

        // ── History normalization ─────────────────────────────────────────────
        test!(
            "history/null",
            "Null history is treated as empty",
            history::test_null_history
        ),
        test!(
            "history/single_object",
            "Single turn object is wrapped; role aliases and text key honored",
            history::test_single_object_history
        ),
        test!(
            "history/opaque_text",
            "Non-JSON history text becomes one user turn",
            history::test_opaque_text_history
        ),
        test!(
            "history/json_encoded",
            "Stringified JSON history is decoded",
            history::test_json_encoded_history
        ),

        // ── Failure mapping ─────────────────────────────────────────────────────
        test!(
            "failures/backend_error",
            "Backend 5xx becomes 502 after exactly one call",
            failures::test_backend_error_is_502
        ),
        test!(
            "failures/malformed_reply",
            "Non-JSON backend reply becomes 500",
            failures::test_malformed_reply_is_500
        ),
        test!(
            "failures/missing_text",
            "Backend reply without text becomes 500",
            failures::test_missing_text_is_500
        ),
        test!(
            "failures/invalid_body",
            "Unparseable request body becomes 400 without a backend call",
            failures::test_invalid_body_is_400
        ),
        test!(
            spawns "failures/unreachable_backend",
            "Dead backend becomes 502 with history unchanged",
            failures::test_unreachable_backend_is_502
        ),
        test!(
            spawns "failures/missing_backend_url",
            "Relay refuses to start without a backend URL",
            failures::test_missing_backend_url_refuses_start
        ),
    ]
}
