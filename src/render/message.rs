//! Message blocks

use super::{comment_block, Renderer};
use crate::model::{Declaration, FieldDecl, MessageDecl};

impl Renderer<'_> {
    /// Section for one message: header, field table, source and example includes
    pub fn render_message(&self, message: &MessageDecl) -> String {
        let mut out = String::new();
        self.section_header(&mut out, Declaration::Message(message));

        let collapsible = self.options.collapsible;
        self.table_caption(&mut out, &message.name, collapsible);
        out.push_str("\n[cols=\"2,2,1,1\", options=\"header\"]\n|===\n");
        out.push_str("| Name | Type | Repeated | Sequence");
        for field in &message.fields {
            out.push_str(&self.field_row(&message.name, field));
        }
        if message.fields.is_empty() {
            out.push('\n');
        }
        out.push_str("\n|===\n");
        if collapsible {
            out.push_str("====\n");
        }

        self.protobuf_source(&mut out, &message.name);

        if let Some(example) = self.includes.message_example(message) {
            out.push_str(&format!(
                "\ninclude::{}[tag={}Message, leveloffset=+1]\n",
                example, message.name
            ));
        }

        self.section_footer(&mut out, &message.name);
        out
    }

    fn field_row(&self, message: &str, field: &FieldDecl) -> String {
        let mut row = format!(
            "\n|[[{}_{}]]{}\n|{}\n|{}\n|{}",
            message.to_lowercase(),
            field.name,
            field.name,
            self.types.resolve_field(field).display(self.options.xref),
            self.bool_cell(field.repeated),
            field.number,
        );
        if !field.comments.is_blank() {
            row.push_str("\n\n|  \n3+|");
            row.push_str(comment_block(&field.comments).trim_end_matches('\n'));
        }
        row
    }
}
