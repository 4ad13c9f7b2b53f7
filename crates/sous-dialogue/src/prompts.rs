//! Prompt templates for every model call the dialogue makes.
//!
//! Templates use `{name}` placeholders filled with `str::replace`, except the
//! forecast placeholder, which survives prompt assembly and is resolved right
//! before synthesis.

/// Persona for recipe generation, trend queries and revisions.
pub const SYSTEM_PROMPT: &str = "\
당신은 레시피 생성 도우미입니다. \
사용자 입력 조건을 최우선으로 반영해 실용적이고 따라 하기 쉬운 레시피를 작성하세요. \
한국어로만 답변하세요. \
과장/추측은 피하고, 일반적인 조리법 기준으로 작성하세요.";

pub const TREND_SUMMARY_SYSTEM_PROMPT: &str = "당신은 검색 결과를 요약하는 분석가입니다.";

pub const FORECAST_SELECTION_SYSTEM_PROMPT: &str = "당신은 재료 후보를 선별하는 도우미입니다.";

/// Marker left in the generation prompt until concepts are selected
pub const FORECAST_PLACEHOLDER: &str = "__FORECAST_SELECTED__";

/// Stands in for a missing field or an empty selection
pub const NONE_MARKER: &str = "없음";

/// Header of the trend annotation appended to the generation prompt.
/// The model is told not to print what follows it.
pub const TREND_ANNOTATION_HEADER: &str = "\n\n[트렌드 요약 - 내부 참고용, 출력 금지]\n";

const RECIPE_SCHEMA: &str = "\
{
  \"title\": \"레시피 이름\",
  \"description\": \"레시피 소개 (2~3문장)\",
  \"ingredients\": [\"재료와 분량\"],
  \"steps\": [\"조리 단계\"]
}";

const GENERATION_PROMPT: &str = "\
아래 조건으로 2~3인분 레시피를 하나 만들어 주세요.

[메뉴/기존 레시피]
{base_recipe}

[추가 조건/아이디어]
{constraints}

[반영할 트렌드 재료]
{forecast}

규칙:
- 메뉴/기존 레시피가 없음이면 조건에 맞는 메뉴를 자유롭게 정하세요.
- 반영할 트렌드 재료가 없음이 아니면 레시피에 자연스럽게 포함하세요.
- 재료에는 분량을 함께 적으세요.

출력:
- 아래 JSON 객체만 반환하고 다른 문장은 쓰지 마세요.
{schema}";

const TREND_QUERY_PROMPT: &str = "\
당신은 {country} 식품 시장 트렌드 리서처입니다.
아래 레시피 조건과 관련된 {country} 현지 트렌드를 찾기 위한 검색어를 정확히 4개 만드세요.
검색어는 {country} 현지 언어로 작성하세요.

[메뉴/기존 레시피]
{base_recipe}

[추가 조건/아이디어]
{constraints}

검색어 4개는 각각 다음 축을 하나씩 담당합니다:
1. 메뉴/외식 트렌드
2. 맛/식감/형태 트렌드
3. 카테고리 트렌드
4. 산업 리포트 트렌드

출력:
- JSON 배열만 반환 (예: [\"검색어1\", \"검색어2\", \"검색어3\", \"검색어4\"])";

const TREND_SUMMARY_PROMPT: &str = "\
아래는 {country} 식품 트렌드 검색 결과입니다.
레시피 기획에 참고할 트렌드 키워드를 뽑아 요약하세요.
검색 결과에 없는 내용은 추측하지 마세요.

[검색 결과]
{search_results}

출력 형식 (JSON):
{
  \"country\": \"{country}\",
  \"trends\": [
    {\"term\": \"트렌드 키워드\", \"summary\": \"한두 문장 요약\", \"source\": \"출처 링크\", \"date\": \"게시일\"}
  ]
}";

const FORECAST_SELECTION_PROMPT: &str = "\
당신은 레시피 기획자입니다.
아래 후보 재료 중에서 사용자 입력과 어울리는 재료만 0~2개 선택하세요.
어울리는 재료가 없으면 빈 배열([])을 반환하세요.
트렌드 요약을 참고해 후보 재료의 적합성을 판단하세요.

[메뉴/기존 레시피]
{base_recipe}

[추가 조건/아이디어]
{constraints}

[트렌드 요약]
{trend_summary}

[후보 재료 목록]
{candidates}

출력:
- JSON 배열만 반환 (예: [\"김치\", \"라면\"] 또는 [])";

const REVISION_PROMPT: &str = "\
아래는 현재 레시피입니다.

[현재 레시피]
{recipe}

[수정 요청]
{request}

수정 요청을 반영해 레시피를 다시 작성하세요.
수정 요청이 비어 있으면 현재 레시피를 다듬어 다시 작성하세요.

출력:
- 같은 JSON 스키마의 객체만 반환하고, 앞뒤 설명이나 코드 블록 없이 JSON만 쓰세요.
{schema}";

fn or_none(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NONE_MARKER,
    }
}

/// Generation prompt built at prompt assembly. Keeps
/// [`FORECAST_PLACEHOLDER`] for synthesis to resolve.
pub fn generation_prompt(base_recipe: Option<&str>, constraints: Option<&str>) -> String {
    GENERATION_PROMPT
        .replace("{base_recipe}", or_none(base_recipe))
        .replace("{constraints}", or_none(constraints))
        .replace("{forecast}", FORECAST_PLACEHOLDER)
        .replace("{schema}", RECIPE_SCHEMA)
}

/// Ask for exactly four localized search queries as a JSON array.
pub fn trend_query_prompt(
    country: &str,
    base_recipe: Option<&str>,
    constraints: Option<&str>,
) -> String {
    TREND_QUERY_PROMPT
        .replace("{country}", country)
        .replace("{base_recipe}", or_none(base_recipe))
        .replace("{constraints}", or_none(constraints))
}

/// Summary template for `country`, still carrying `{search_results}`.
pub fn trend_summary_template(country: &str) -> String {
    TREND_SUMMARY_PROMPT.replace("{country}", country)
}

/// Fill the results slot of a summary template.
pub fn fill_search_results(template: &str, search_results_json: &str) -> String {
    template.replace("{search_results}", search_results_json)
}

pub fn forecast_selection_prompt(
    candidates: &[String],
    base_recipe: Option<&str>,
    constraints: Option<&str>,
    trend_summary: Option<&str>,
) -> String {
    let candidates = serde_json::to_string(candidates).unwrap_or_default();
    FORECAST_SELECTION_PROMPT
        .replace("{base_recipe}", or_none(base_recipe))
        .replace("{constraints}", or_none(constraints))
        .replace("{trend_summary}", or_none(trend_summary))
        .replace("{candidates}", &candidates)
}

/// Rewrite `recipe` according to `request`; an empty request is passed as is.
pub fn revision_prompt(recipe: &str, request: &str) -> String {
    REVISION_PROMPT
        .replace("{recipe}", recipe)
        .replace("{request}", request)
        .replace("{schema}", RECIPE_SCHEMA)
}

/// Append a trend summary as an internal annotation.
pub fn annotate_with_trends(prompt: &str, trend_summary: &str) -> String {
    format!("{}{}{}", prompt, TREND_ANNOTATION_HEADER, trend_summary)
}

/// Resolve the forecast placeholder with the selected concepts.
pub fn resolve_forecast(prompt: &str, selected: &[String]) -> String {
    let text = if selected.is_empty() {
        NONE_MARKER.to_string()
    } else {
        selected.join(", ")
    };
    prompt.replace(FORECAST_PLACEHOLDER, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_keeps_placeholder() {
        let prompt = generation_prompt(Some("김치찌개"), None);
        assert!(prompt.contains("김치찌개"));
        assert!(prompt.contains(FORECAST_PLACEHOLDER));
        assert!(prompt.contains("\"ingredients\""));
        assert!(!prompt.contains("{constraints}"));
        assert!(prompt.contains(&format!("[추가 조건/아이디어]\n{}", NONE_MARKER)));
    }

    #[test]
    fn test_blank_fields_become_none_marker() {
        let prompt = generation_prompt(Some("  "), Some("맵게"));
        assert!(prompt.contains(&format!("[메뉴/기존 레시피]\n{}", NONE_MARKER)));
        assert!(prompt.contains("맵게"));
    }

    #[test]
    fn test_trend_query_prompt_names_four_axes() {
        let prompt = trend_query_prompt("일본", Some("라멘"), None);
        assert!(prompt.contains("일본 식품 시장"));
        assert!(prompt.contains("정확히 4개"));
        for axis in ["메뉴/외식", "맛/식감/형태", "카테고리", "산업 리포트"] {
            assert!(prompt.contains(axis), "missing axis {axis}");
        }
        assert!(!prompt.contains("{base_recipe}"));
    }

    #[test]
    fn test_summary_template_two_stage_fill() {
        let template = trend_summary_template("미국");
        assert!(template.contains("{search_results}"));
        assert!(template.contains("\"country\": \"미국\""));

        let filled = fill_search_results(&template, "[{\"title\": \"t\"}]");
        assert!(!filled.contains("{search_results}"));
        assert!(filled.contains("[{\"title\": \"t\"}]"));
    }

    #[test]
    fn test_forecast_selection_prompt_lists_candidates() {
        let prompt = forecast_selection_prompt(
            &["흑임자".to_string(), "유자".to_string()],
            Some("떡"),
            None,
            None,
        );
        assert!(prompt.contains(r#"["흑임자","유자"]"#));
        assert!(prompt.contains(&format!("[트렌드 요약]\n{}", NONE_MARKER)));
    }

    #[test]
    fn test_revision_prompt_with_empty_request() {
        let prompt = revision_prompt(r#"{"title":"t"}"#, "");
        assert!(prompt.contains("[현재 레시피]\n{\"title\":\"t\"}"));
        assert!(prompt.contains("[수정 요청]\n\n"));
    }

    #[test]
    fn test_resolve_forecast() {
        let prompt = format!("재료: {}", FORECAST_PLACEHOLDER);
        assert_eq!(resolve_forecast(&prompt, &[]), "재료: 없음");
        assert_eq!(
            resolve_forecast(&prompt, &["a".into(), "b".into()]),
            "재료: a, b"
        );
    }

    #[test]
    fn test_annotation() {
        let annotated = annotate_with_trends("p", "s");
        assert_eq!(annotated, "p\n\n[트렌드 요약 - 내부 참고용, 출력 금지]\ns");
    }
}
