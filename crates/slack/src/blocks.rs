use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Wraps oracle-written escalation text. The text is posted as-is; the
/// context line marks it as automated so reviewers know nobody typed it.
pub fn escalation_message(text: &str) -> MessageTemplate {
    MessageBuilder::new(text.to_owned())
        .section("refund.escalation.summary.v1", |section| {
            section.mrkdwn(text.to_owned());
        })
        .context("refund.escalation.context.v1", |context| {
            context.plain("Posted automatically by the servicedesk refund agent");
        })
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{escalation_message, Block, MessageBuilder, TextObject};

    #[test]
    fn message_builder_creates_typed_block_structure() {
        let message = MessageBuilder::new("fallback")
            .section("s.v1", |section| {
                section.plain("hello");
            })
            .context("c.v1", |context| {
                context.mrkdwn("*bold*").plain("tail");
            })
            .build();

        assert_eq!(message.fallback_text, "fallback");
        assert_eq!(
            message.blocks,
            vec![
                Block::Section { block_id: "s.v1".to_string(), text: TextObject::plain("hello") },
                Block::Context {
                    block_id: "c.v1".to_string(),
                    elements: vec![TextObject::mrkdwn("*bold*"), TextObject::plain("tail")],
                },
            ]
        );
    }

    #[test]
    fn blocks_serialize_with_slack_type_names() {
        let message = escalation_message(":rotating_light: Refund Escalation - Order ORD-002");
        let serialized = serde_json::to_value(&message.blocks).expect("serialize blocks");

        assert_eq!(serialized[0]["type"], json!("section"));
        assert_eq!(serialized[0]["text"]["type"], json!("mrkdwn"));
        assert_eq!(serialized[1]["type"], json!("context"));
        assert_eq!(serialized[1]["elements"][0]["type"], json!("plain_text"));
    }

    #[test]
    fn escalation_message_keeps_text_as_fallback() {
        let text = "Refund Escalation - Order ORD-003 - $1500.00 - Requires executive approval";
        let message = escalation_message(text);

        assert_eq!(message.fallback_text, text);
        assert!(matches!(
            &message.blocks[0],
            Block::Section { text: TextObject::Mrkdwn { text: body }, .. } if body == text
        ));
    }
}
