use anyhow::Context;

/// Stored template for `prompt_key`. `None` when there is no row or its template is NULL.
pub async fn fetch_prompt_template(pool: &sqlx::PgPool, prompt_key: &str) -> anyhow::Result<Option<String>> {
    let template: Option<Option<String>> = sqlx::query_scalar(
        "SELECT prompt_template FROM llm_prompts WHERE prompt_key = $1 LIMIT 1",
    )
    .persistent(false)
    .bind(prompt_key)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select llm_prompts failed ({prompt_key})"))?;

    Ok(template.flatten())
}
