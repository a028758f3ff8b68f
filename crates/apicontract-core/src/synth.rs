//! Specification → test case compiler
//!
//! Walks paths, then methods, then statuses, then query-parameter
//! expansions, emitting one [`TestCase`] per fixture. A malformed document
//! aborts the whole pass; partial output is never returned.

use serde_json::Value;

use crate::endpoint::{EndpointError, build_endpoint, join_base_path, query_fragment};
use crate::fixture::{
    Fixture, HttpMethod, RequestFixture, ResponseFixture, TestCase, standard_headers,
};
use crate::spec::{
    Operation, ParamLocation, Parameter, ResponseExamples, Specification, effective_parameters,
};

/// Statuses that never produce fixtures (auth and server-error paths).
pub const SKIPPED_STATUSES: &[&str] = &["401", "500"];

/// Status whose query parameters are expanded into extra fixtures.
const EXPANDED_STATUS: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("{method} {path}: unsupported HTTP method")]
    UnsupportedMethod { path: String, method: String },
    #[error("{method} {path}: operation has no responses")]
    MissingResponses { path: String, method: String },
    #[error("{method} {path} -> {status}: response has no examples")]
    MissingExamples {
        path: String,
        method: String,
        status: String,
    },
    #[error("{method} {path}: {source}")]
    Endpoint {
        path: String,
        method: String,
        #[source]
        source: EndpointError,
    },
}

/// Compile a specification into test cases.
///
/// # Errors
///
/// Returns the first [`SynthesisError`] met; see the type for the cases.
pub fn synthesize(spec: &Specification) -> Result<Vec<TestCase>, SynthesisError> {
    let mut cases = Vec::new();

    for (template, item) in &spec.paths {
        for (method_key, operation) in &item.operations {
            let method: HttpMethod =
                method_key
                    .parse()
                    .map_err(|_| SynthesisError::UnsupportedMethod {
                        path: template.clone(),
                        method: method_key.clone(),
                    })?;
            let parameters = effective_parameters(item, operation);
            let ctx = OperationContext {
                base_path: &spec.base_path,
                template,
                method,
                operation,
                parameters: &parameters,
            };
            ctx.synthesize_into(&mut cases)?;
        }
    }

    tracing::debug!(cases = cases.len(), "synthesis complete");
    Ok(cases)
}

/// Everything the per-operation walk needs.
struct OperationContext<'a> {
    base_path: &'a str,
    template: &'a str,
    method: HttpMethod,
    operation: &'a Operation,
    parameters: &'a [Parameter],
}

impl OperationContext<'_> {
    fn label(&self) -> String {
        format!("{} {}", self.method, self.template)
    }

    fn synthesize_into(&self, cases: &mut Vec<TestCase>) -> Result<(), SynthesisError> {
        let responses =
            self.operation
                .responses
                .as_ref()
                .ok_or_else(|| SynthesisError::MissingResponses {
                    path: self.template.to_string(),
                    method: self.method.to_string(),
                })?;

        for (status_key, response) in responses {
            if SKIPPED_STATUSES.contains(&status_key.as_str()) {
                continue;
            }
            let Ok(status) = status_key.parse::<u16>() else {
                tracing::warn!(
                    operation = %self.label(),
                    status = %status_key,
                    "skipping response without a literal status code"
                );
                continue;
            };
            let examples =
                response
                    .examples
                    .as_ref()
                    .ok_or_else(|| SynthesisError::MissingExamples {
                        path: self.template.to_string(),
                        method: self.method.to_string(),
                        status: status_key.clone(),
                    })?;

            let baseline = format!(
                "{} with status of {status}: {}",
                self.operation.description, response.description
            );

            cases.push(self.case(
                cases.len(),
                baseline.clone(),
                status,
                &response.description,
                examples,
                None,
                &examples.response,
            )?);

            if status == EXPANDED_STATUS {
                self.expand_query_parameters(
                    cases,
                    &baseline,
                    status,
                    &response.description,
                    examples,
                )?;
            }
        }
        Ok(())
    }

    /// Extra fixtures for query parameters carrying a literal example, plus
    /// their named scenarios.
    fn expand_query_parameters(
        &self,
        cases: &mut Vec<TestCase>,
        baseline: &str,
        status: u16,
        response_description: &str,
        examples: &ResponseExamples,
    ) -> Result<(), SynthesisError> {
        for param in self
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Query)
        {
            let Some(example) = &param.example else {
                continue;
            };

            let expected = examples
                .override_for(&param.name)
                .unwrap_or(&examples.response);
            cases.push(self.case(
                cases.len(),
                format!("{baseline} with {} query parameter", param.name),
                status,
                response_description,
                examples,
                Some(query_fragment(&param.name, example)),
                expected,
            )?);

            // Labelled and overridden by scenario name, not parameter name:
            // one parameter can carry several scenarios.
            for (scenario, value) in &param.examples {
                let expected = examples
                    .override_for(scenario)
                    .unwrap_or(&examples.response);
                cases.push(self.case(
                    cases.len(),
                    format!("{baseline} with {scenario} specified"),
                    status,
                    response_description,
                    examples,
                    Some(query_fragment(&param.name, value)),
                    expected,
                )?);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn case(
        &self,
        id: usize,
        description: String,
        status: u16,
        response_description: &str,
        examples: &ResponseExamples,
        extra_query: Option<String>,
        expected: &Value,
    ) -> Result<TestCase, SynthesisError> {
        let endpoint = build_endpoint(
            self.template,
            self.parameters,
            examples,
            extra_query.as_deref(),
        )
        .map_err(|source| SynthesisError::Endpoint {
            path: self.template.to_string(),
            method: self.method.to_string(),
            source,
        })?;

        Ok(TestCase {
            id,
            operation: self.label(),
            description,
            fixture: Fixture {
                request: RequestFixture {
                    path: join_base_path(self.base_path, &endpoint),
                    method: self.method,
                    headers: standard_headers(),
                    body: examples.request.clone(),
                },
                response: ResponseFixture {
                    status,
                    description: response_description.to_string(),
                    body: expected.clone(),
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(v: Value) -> Specification {
        serde_json::from_value(v).unwrap()
    }

    fn widgets_spec() -> Specification {
        spec(json!({
            "basePath": "/api",
            "paths": {
                "/widgets/{id}": {
                    "get": {
                        "description": "Get widget",
                        "parameters": [
                            {"name": "id", "in": "path", "required": true, "example": "7"}
                        ],
                        "responses": {
                            "200": {
                                "description": "Found",
                                "examples": {"response": {"id": "${number}", "name": "widget"}}
                            },
                            "401": {"description": "Unauthorized"},
                            "500": {"description": "Boom"}
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn skips_401_and_500() {
        let cases = synthesize(&widgets_spec()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].fixture.response.status, 200);
    }

    #[test]
    fn baseline_fixture_contents() {
        let cases = synthesize(&widgets_spec()).unwrap();
        let case = &cases[0];
        assert_eq!(case.id, 0);
        assert_eq!(case.operation, "GET /widgets/{id}");
        assert_eq!(case.description, "Get widget with status of 200: Found");
        assert_eq!(case.fixture.request.path, "/api/widgets/7");
        assert_eq!(case.fixture.request.method, HttpMethod::Get);
        assert_eq!(case.fixture.request.headers, standard_headers());
        assert_eq!(case.fixture.request.body, None);
        assert_eq!(case.fixture.response.description, "Found");
        assert_eq!(
            case.fixture.response.body,
            json!({"id": "${number}", "name": "widget"})
        );
    }

    fn search_spec(status: &str) -> Specification {
        spec(json!({
            "paths": {
                "/widgets": {
                    "get": {
                        "description": "List widgets",
                        "parameters": [
                            {"name": "limit", "in": "query", "example": 1},
                            {"name": "color", "in": "query", "example": "color=red"},
                            {"name": "sort", "in": "query"}
                        ],
                        "responses": {
                            status: {
                                "description": "OK",
                                "examples": {
                                    "response": [{"id": 1}, {"id": 2}],
                                    "response_limit": [{"id": 1}]
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn expands_query_examples_for_200() {
        let cases = synthesize(&search_spec("200")).unwrap();
        assert_eq!(cases.len(), 3);

        assert_eq!(cases[1].fixture.request.path, "/widgets?limit=1");
        assert_eq!(
            cases[1].description,
            "List widgets with status of 200: OK with limit query parameter"
        );
        assert_eq!(cases[1].fixture.response.body, json!([{"id": 1}]));

        assert_eq!(cases[2].fixture.request.path, "/widgets?color=red");
        assert_eq!(
            cases[2].fixture.response.body,
            json!([{"id": 1}, {"id": 2}]),
            "falls back to the baseline response"
        );
        assert_eq!(
            cases.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn no_expansion_for_other_statuses() {
        let cases = synthesize(&search_spec("201")).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn named_scenarios_expand_alongside_literal_example() {
        let s = spec(json!({
            "paths": {
                "/widgets": {
                    "get": {
                        "description": "List",
                        "parameters": [{
                            "name": "limit",
                            "in": "query",
                            "example": 1,
                            "examples": {"large": 100}
                        }],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "examples": {"response": [], "response_large": [{"id": 1}]}
                            }
                        }
                    }
                }
            }
        }));
        let cases = synthesize(&s).unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[2].fixture.request.path, "/widgets?limit=100");
        assert_eq!(
            cases[2].description,
            "List with status of 200: OK with large specified"
        );
        assert_eq!(cases[2].fixture.response.body, json!([{"id": 1}]));
    }

    #[test]
    fn scenarios_without_literal_example_do_not_expand() {
        let s = spec(json!({
            "paths": {"/w": {"get": {
                "parameters": [{"name": "q", "in": "query", "examples": {"a": "x"}}],
                "responses": {"200": {"description": "OK", "examples": {"response": {}}}}
            }}}
        }));
        assert_eq!(synthesize(&s).unwrap().len(), 1);
    }

    #[test]
    fn post_carries_request_body() {
        let s = spec(json!({
            "paths": {"/widgets": {"post": {
                "description": "Create",
                "responses": {"201": {
                    "description": "Created",
                    "examples": {"request": {"name": "w"}, "response": {"id": "${number}"}}
                }}
            }}}
        }));
        let cases = synthesize(&s).unwrap();
        assert_eq!(cases[0].fixture.request.method, HttpMethod::Post);
        assert_eq!(cases[0].fixture.request.body, Some(json!({"name": "w"})));
        assert_eq!(cases[0].fixture.response.status, 201);
    }

    #[test]
    fn missing_responses_is_fatal() {
        let s = spec(json!({"paths": {"/w": {"get": {"description": "x"}}}}));
        assert_eq!(
            synthesize(&s).unwrap_err(),
            SynthesisError::MissingResponses {
                path: "/w".into(),
                method: "GET".into()
            }
        );
    }

    #[test]
    fn missing_examples_is_fatal() {
        let s = spec(json!({"paths": {"/w": {"get": {
            "responses": {"200": {"description": "OK"}}
        }}}}));
        assert!(matches!(
            synthesize(&s).unwrap_err(),
            SynthesisError::MissingExamples { status, .. } if status == "200"
        ));
    }

    #[test]
    fn skipped_statuses_need_no_examples() {
        let s = spec(json!({"paths": {"/w": {"get": {
            "responses": {
                "204": {"description": "Empty", "examples": {}},
                "401": {"description": "Unauthorized"}
            }
        }}}}));
        assert_eq!(synthesize(&s).unwrap().len(), 1);
    }

    #[test]
    fn unsupported_method_is_fatal() {
        let s = spec(json!({"paths": {"/w": {"options": {"responses": {}}}}}));
        assert_eq!(
            synthesize(&s).unwrap_err(),
            SynthesisError::UnsupportedMethod {
                path: "/w".into(),
                method: "options".into()
            }
        );
    }

    #[test]
    fn missing_path_example_is_fatal() {
        let s = spec(json!({"paths": {"/w/{id}": {"get": {
            "parameters": [{"name": "id", "in": "path", "required": true}],
            "responses": {"200": {"description": "OK", "examples": {}}}
        }}}}));
        assert!(matches!(
            synthesize(&s).unwrap_err(),
            SynthesisError::Endpoint { .. }
        ));
    }

    #[test]
    fn non_numeric_status_is_skipped() {
        let s = spec(json!({"paths": {"/w": {"get": {
            "responses": {
                "default": {"description": "Anything"},
                "200": {"description": "OK", "examples": {}}
            }
        }}}}));
        let cases = synthesize(&s).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].fixture.response.body, Value::Null);
    }

    #[test]
    fn order_follows_paths_methods_statuses() {
        let s = spec(json!({"paths": {
            "/b": {"get": {"responses": {"200": {"examples": {}}}}},
            "/a": {
                "post": {"responses": {"201": {"examples": {}}, "400": {"examples": {}}}},
                "delete": {"responses": {"204": {"examples": {}}}}
            }
        }}));
        let cases = synthesize(&s).unwrap();
        let lines: Vec<_> = cases
            .iter()
            .map(|c| format!("{} {}", c.request_line(), c.fixture.response.status))
            .collect();
        assert_eq!(
            lines,
            vec![
                "DELETE /a 204",
                "POST /a 201",
                "POST /a 400",
                "GET /b 200",
            ]
        );
    }

    #[test]
    fn each_case_owns_its_fixture() {
        let mut cases = synthesize(&search_spec("200")).unwrap();
        cases[0].fixture.response.body = json!("changed");
        assert_eq!(cases[1].fixture.response.body, json!([{"id": 1}]));
        assert_eq!(cases[2].fixture.response.body, json!([{"id": 1}, {"id": 2}]));
    }
}
