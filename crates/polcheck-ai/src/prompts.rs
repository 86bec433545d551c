//! Prompt templates for the three model calls.

use polcheck_core::ComplianceAnalysis;

/// Question answering over retrieved regulatory context.
pub fn question_prompt(context: &str, question: &str) -> String {
    format!(
        "\
You are a legal expert specialized in European and GDPR law.

Use the following retrieved context to answer the user's question precisely.
If uncertain, say you don't know.

Context:
{context}

Question:
{question}

Answer in a clear, structured format. Highlight key legal principles, relevant EU directives, and practical implications.
"
    )
}

/// Comparison of an internal document against regulatory context, asking
/// for the JSON analysis object.
pub fn comparison_prompt(document_content: &str, context: &str) -> String {
    format!(
        r#"You are a legal compliance expert specialized in European regulations (GDPR, AI Act, NIS2, DSA, DMA, etc.).

Your task is to compare an internal policy/procedure document against relevant EU regulations and identify specific discrepancies.

**Internal Document Content:**
{document_content}

**Relevant Regulatory Context:**
{context}

**Instructions:**
1. Analyze the internal document against the regulatory context provided
2. Identify specific discrepancies, gaps, or non-compliance issues
3. For EACH discrepancy, you MUST cite the specific article, section, or recital from the regulation
4. Return your analysis as a JSON object with the following structure:

{{
    "summary": "Brief overview of overall compliance status",
    "discrepancies": [
        {{
            "title": "Title of the discrepancy",
            "issue": "Description of the discrepancy",
            "location_in_document": "Where in the document this appears",
            "regulatory_violation": "Specific regulation/article violated",
            "citation": "Exact article number, e.g., 'GDPR Article 6(1)(a)' or 'AI Act Article 10(2)'",
            "required_action": "What needs to be changed",
            "severity": "High/Medium/Low (optional)"
        }}
    ],
    "compliance_score": 75.0,
    "recommendations": [
        "Actionable step 1",
        "Actionable step 2"
    ]
}}

**Important Requirements:**
- Always cite specific articles when flagging discrepancies (format: "Regulation Name Article X")
- If no discrepancies are found, return an empty discrepancies array
- Compliance score must be a number between 0 and 100
- Return ONLY valid JSON, no additional text or markdown formatting
"#
    )
}

/// Short human-readable overview of a finished analysis.
pub fn overview_prompt(analysis: &ComplianceAnalysis) -> String {
    let score = analysis
        .compliance_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "\
You are an EU compliance expert.
Provide a concise summary (max 6-8 lines) of the compliance analysis below.
Highlight the number of discrepancies found and overall compliance status.

Analysis Summary: {summary}
Number of Discrepancies: {count}
Compliance Score: {score}

Format your response naturally and clearly in Markdown.
",
        summary = analysis.summary,
        count = analysis.discrepancy_count(),
    )
}
