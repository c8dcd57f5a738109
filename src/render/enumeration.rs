//! Enum blocks

use super::Renderer;
use crate::model::{Declaration, EnumDecl};

impl Renderer<'_> {
    /// Section for one enum: header and a `Name | Integer | Comment` table
    pub fn render_enum(&self, enumeration: &EnumDecl) -> String {
        let mut out = String::new();
        self.section_header(&mut out, Declaration::Enum(enumeration));

        let collapsible = self.options.collapsible;
        self.table_caption(&mut out, &enumeration.name, collapsible);
        out.push_str("\n[cols=\"2,1,3\", options=\"header\"]\n|===\n");
        out.push_str("| Name | Integer | Comment");
        for value in &enumeration.values {
            out.push_str(&format!(
                "\n|[[{}_{}]]{}\n|{}\n|{}",
                enumeration.name,
                value.name,
                value.name,
                value.number,
                value.comments.text(),
            ));
        }
        if enumeration.values.is_empty() {
            out.push('\n');
        }
        out.push_str("\n|===\n");
        if collapsible {
            out.push_str("====\n");
        }

        self.protobuf_source(&mut out, &enumeration.name);
        self.section_footer(&mut out, &enumeration.name);
        out
    }
}
