//! Grounded answer prompt

/// Prompt asking for an answer drawn only from `facts`, one fact per line
pub fn build_prompt<'a>(facts: impl IntoIterator<Item = &'a str>, query: &str) -> String {
    let context = facts.into_iter().collect::<Vec<_>>().join("\n");

    format!(
        "Answer the question using only the context provided.\n\
         If the answer cannot be found in the context, respond with \"I don't know.\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {query}\n\
         \n\
         Answer:"
    )
}
