//! The pediatrician prompt and its assembly from retrieved passages.

use crate::models::ScoredEntry;

/// Fixed template sent to the generation backend. `{context}` and
/// `{question}` are substituted by [`build_prompt`]. Whitespace, including
/// the indentation and trailing spaces, is sent to the model as is.
pub const PEDIATRICIAN_TEMPLATE: &str = concat!(
    "\n",
    "    You are a pediatrician. You will be provided with a context, which is an excerpt \n",
    "    from the book \"What to Expect the First Year\". Use this context to answer the \n",
    "    question as accurately as possible.\n",
    "\n",
    "    If the context does not contain the answer, say \"I don't know\".\n",
    "\n",
    "    Context:\n",
    "    {context}\n",
    "\n",
    "    Question:\n",
    "    {question}\n",
    "\n",
    "    Answer:\n",
    "    ",
);

/// Join retrieved passages in the order they were returned.
pub fn join_context(entries: &[ScoredEntry]) -> String {
    entries
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the template with the joined context and the verbatim question.
///
/// The context is substituted first so that a question containing the
/// literal text `{context}` is left untouched.
pub fn build_prompt(context: &str, question: &str) -> String {
    let (head, tail) = PEDIATRICIAN_TEMPLATE
        .split_once("{question}")
        .unwrap_or((PEDIATRICIAN_TEMPLATE, ""));
    let mut prompt = head.replace("{context}", context);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}
