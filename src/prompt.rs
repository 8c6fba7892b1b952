use crate::llm_client::ChatMessage;
use crate::models::{ConversationTurn, PropertyContext};
use bigdecimal::BigDecimal;

/// Number of past turns replayed to the model.
pub const HISTORY_WINDOW: usize = 10;

/// Formats a dollar amount with thousands separators, no cents: `$1,250,000`.
pub fn format_price(price: &BigDecimal) -> String {
    let whole = price.with_scale(0).to_string();
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}", sign, grouped)
}

fn push_line(out: &mut String, label: &str, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        out.push_str(&format!("- {}: {}\n", label, v));
    }
}

/// System prompt describing the property, the listing agent's brand and page context.
pub fn build_system_prompt(
    property: &PropertyContext,
    context: Option<&serde_json::Value>,
) -> String {
    let agent = property
        .agent_name
        .clone()
        .unwrap_or_else(|| "the listing agent".to_string());

    let mut prompt = format!(
        "You are a friendly, knowledgeable real estate assistant answering questions about {} on behalf of {}",
        property.display_name(),
        agent
    );
    if let Some(brokerage) = property.brokerage_name.as_deref() {
        prompt.push_str(&format!(" of {}", brokerage));
    }
    prompt.push_str(".\n");
    if let Some(tagline) = property.brand_tagline.as_deref() {
        prompt.push_str(&format!("Brand voice: {}\n", tagline));
    }

    prompt.push_str("\nProperty details:\n");
    push_line(&mut prompt, "Address", property.address.clone());
    push_line(
        &mut prompt,
        "Location",
        match (property.city.as_deref(), property.state.as_deref()) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(state)) => Some(state.to_string()),
            (None, None) => None,
        },
    );
    push_line(&mut prompt, "ZIP", property.zip_code.clone());
    push_line(&mut prompt, "Price", property.price.as_ref().map(format_price));
    push_line(
        &mut prompt,
        "Bedrooms",
        property.bedrooms.map(|b| b.to_string()),
    );
    push_line(
        &mut prompt,
        "Bathrooms",
        property.bathrooms.as_ref().map(|b| b.normalized().to_string()),
    );
    push_line(
        &mut prompt,
        "Square feet",
        property.square_feet.map(|s| s.to_string()),
    );
    push_line(&mut prompt, "Type", property.property_type.clone());
    push_line(
        &mut prompt,
        "Features",
        property
            .features
            .as_ref()
            .filter(|f| !f.is_empty())
            .map(|f| f.join(", ")),
    );
    push_line(&mut prompt, "Description", property.description.clone());

    if let Some(ctx) = context.filter(|c| !c.is_null()) {
        prompt.push_str(&format!("\nVisitor page context: {}\n", ctx));
    }

    prompt.push_str(
        "\nAnswer only from the details above and general home-buying knowledge. \
         Keep replies under 120 words. If you do not know something, offer to connect the \
         visitor with the agent. Gently learn the visitor's budget, timeline, financing and \
         must-have features, and invite them to schedule a viewing when they seem interested.",
    );

    prompt
}

/// Full message list for one turn: system prompt, last turns of history, current message.
pub fn build_messages(
    property: &PropertyContext,
    context: Option<&serde_json::Value>,
    history: &[ConversationTurn],
    message: &str,
) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let recent = &history[start..];

    let mut messages = Vec::with_capacity(recent.len() * 2 + 2);
    messages.push(ChatMessage::system(build_system_prompt(property, context)));
    for turn in recent {
        messages.push(ChatMessage::user(turn.user_message.clone()));
        messages.push(ChatMessage::assistant(turn.ai_response.clone()));
    }
    messages.push(ChatMessage::user(message));

    messages
}
