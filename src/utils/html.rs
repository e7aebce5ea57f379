use std::{collections::HashSet, sync::LazyLock};

/// Strips every tag, keeping only text. `<script>` and `<style>` lose their
/// content as well.
static TEXT_ONLY: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let mut builder = ammonia::Builder::default();
    builder.tags(HashSet::new());
    builder
});

/// Sanitizes a free-text answer before it is stored.
///
/// Answers are rendered back on the results page and in charts, so markup is
/// removed rather than escaped at display time. Note that the output is HTML
/// text: characters such as `&` and `<` come back entity-encoded.
pub fn clean_answer(input: &str) -> String {
    TEXT_ONLY.clean(input).to_string().trim().to_string()
}
