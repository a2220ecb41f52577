//! Test registry - all test cases are registered here

pub mod helpers;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Tests are grouped by category. Each test:
/// 1. Queues a mock upstream response (what the inference API would return)
/// 2. Sends a request to the REAL proxy
/// 3. Validates the response and what the upstream received
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        ($name:expr, $desc:expr, $func:path) => {
            TestCase {
                name: $name,
                description: $desc,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
    }

    vec![
        // ── Basic behavior ────────────────────────────────────────────────────
        test!(
            "basic/simple_text_non_streaming",
            "Non-streaming JSON response passes through unchanged",
            basic::test_simple_text_non_streaming
        ),
        test!(
            "basic/api_key_injected",
            "Upstream gets the server's bearer token and User-Agent",
            basic::test_api_key_injected
        ),
        test!(
            "basic/idempotent",
            "Identical requests produce identical payloads and responses",
            basic::test_identical_requests_identical_responses
        ),
        test!(
            "basic/path_ignored",
            "Requests on any path are handled the same way",
            basic::test_path_is_ignored
        ),

        // ── CORS and methods ──────────────────────────────────────────────────
        test!(
            "cors/preflight",
            "OPTIONS returns 200, empty body, CORS headers, no upstream call",
            cors::test_preflight
        ),
        test!(
            "cors/method_not_allowed",
            "GET/PUT/DELETE return 405 with the JSON error body",
            cors::test_method_not_allowed
        ),
        test!(
            "cors/json_responses",
            "Buffered success and error responses carry CORS headers",
            cors::test_cors_on_json_responses
        ),

        // ── Validation ─────────────────────────────────────────────────────────
        test!(
            "validation/missing_model",
            "Missing model is a 400 naming the field",
            validation::test_missing_model
        ),
        test!(
            "validation/missing_both",
            "Falsy model and messages are both reported in order",
            validation::test_missing_both
        ),
        test!(
            "validation/empty_messages_array",
            "An empty messages array is truthy and forwarded",
            validation::test_empty_messages_array_forwarded
        ),
        test!(
            "validation/malformed_body",
            "A non-JSON body fails validation",
            validation::test_malformed_body
        ),

        // ── Defaults ───────────────────────────────────────────────────────────
        test!(
            "defaults/applied",
            "Omitted generation parameters get their defaults",
            defaults::test_defaults_applied
        ),
        test!(
            "defaults/caller_values_kept",
            "Truthy caller parameters are forwarded as given",
            defaults::test_caller_values_kept
        ),
        test!(
            "defaults/zero_replaced",
            "A caller's 0 is replaced by the default",
            defaults::test_zero_replaced_by_default
        ),
        test!(
            "defaults/unknown_fields_dropped",
            "Fields outside the forwarded set never reach upstream",
            defaults::test_unknown_fields_dropped
        ),

        // ── Tools ──────────────────────────────────────────────────────────────
        test!(
            "tools/forwarded",
            "Non-empty tools and tool_choice are forwarded unchanged",
            tools::test_tools_forwarded
        ),
        test!(
            "tools/choice_without_tools",
            "tool_choice is dropped when tools are empty",
            tools::test_tool_choice_without_tools
        ),
        test!(
            "tools/without_choice",
            "Tools without tool_choice forward only tools",
            tools::test_tools_without_choice
        ),

        // ── Upstream errors ────────────────────────────────────────────────────
        test!(
            "errors/known_statuses",
            "429/401/400/503 keep their status with a friendly message",
            errors::test_known_statuses_translated
        ),
        test!(
            "errors/other_status_relayed",
            "Other upstream statuses relay the raw body",
            errors::test_other_status_relayed
        ),
        test!(
            "errors/streaming_request_json_error",
            "Upstream errors on streaming requests are JSON, not SSE",
            errors::test_streaming_request_error_is_json
        ),
        test!(
            "errors/undecodable_success",
            "A non-JSON 200 from upstream becomes a 500",
            errors::test_undecodable_success
        ),

        // ── Streaming relay ────────────────────────────────────────────────────
        test!(
            "streaming/relayed",
            "Upstream SSE chunks are relayed unchanged and in order",
            streaming::test_stream_relayed
        ),
        test!(
            "streaming/headers",
            "SSE response headers with narrowed CORS",
            streaming::test_stream_headers
        ),
        test!(
            "streaming/upstream_request",
            "Streaming requests ask upstream for text/event-stream",
            streaming::test_stream_upstream_request
        ),
        test!(
            "streaming/interrupted",
            "A broken upstream stream ends with the interruption event",
            streaming::test_stream_interrupted
        ),
    ]
}
