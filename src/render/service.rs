//! Service blocks and per-method endpoint sections

use super::{comment_block, Renderer};
use crate::model::{Declaration, MethodDecl, RestBinding, ServiceDecl};

impl Renderer<'_> {
    /// Section for one service: overview table, intro include, then one
    /// endpoint section per method
    pub fn render_service(&self, service: &ServiceDecl) -> String {
        let mut out = String::new();
        self.section_header(&mut out, Declaration::Service(service));

        self.table_caption(&mut out, &service.name, true);
        out.push_str("\n|===\n");
        out.push_str("| Name | Requests | Streams | Returns | Streams | Comment");
        for method in &service.methods {
            out.push_str(&format!(
                "\n|{}\n|{}\n|{}\n|{}\n|{}\n|{}",
                method.name,
                method.request_type,
                self.bool_cell(method.client_streaming),
                method.response_type,
                self.bool_cell(method.server_streaming),
                method.comments.text(),
            ));
        }
        if service.methods.is_empty() {
            out.push('\n');
        }
        out.push_str("\n|===\n====\n");

        if let Some(intro) = self.includes.service_intro(service) {
            out.push_str(&format!("include::{}[leveloffset=+2]\n", intro));
        }

        for method in &service.methods {
            out.push_str(&self.endpoint_section(service, method));
        }

        self.section_footer(&mut out, &service.name);
        out
    }

    fn endpoint_section(&self, service: &ServiceDecl, method: &MethodDecl) -> String {
        let mut out = String::from("<<<\n");
        out.push_str(&format!(
            "[#{}_{}]\n",
            service.name.to_lowercase(),
            method.name.to_lowercase()
        ));
        out.push_str(&format!("=== {} Endpoint\n", method.name));
        out.push_str(&comment_block(&method.comments));

        out.push_str("\n[cols=\">1,<3\"]\n\n|===");
        out.push_str(&format!("\n| Name | {}", method.name));
        out.push_str(&format!(
            "\n| Request Type | {}",
            self.types.resolve(&method.request_type).display(self.options.xref)
        ));
        out.push_str(&format!(
            "\n| Streaming Request | {}",
            self.bool_cell(method.client_streaming)
        ));
        out.push_str(&format!(
            "\n| Return Type | {}",
            self.types.resolve(&method.response_type).display(self.options.xref)
        ));
        out.push_str(&format!(
            "\n| Streaming Return | {}",
            self.bool_cell(method.server_streaming)
        ));
        out.push_str(&format!(
            "\n| REST Support | {}",
            self.bool_cell(method.rest.is_some())
        ));
        if let Some(rest) = &method.rest {
            out.push_str(&rest_rows(rest));
        }
        out.push_str("\n|===\n");

        self.protobuf_source(&mut out, &method.name);

        if let Some(doc) = self.includes.method_doc(service, method) {
            out.push_str(&format!("include::{}[leveloffset=+2]", doc));
        }
        out.push('\n');
        out
    }
}

fn rest_rows(rest: &RestBinding) -> String {
    let mut rows = format!(
        "\n| REST Method | {}\n| REST URL | `{}`",
        rest.method.to_uppercase(),
        rest.url
    );
    if let Some(body) = &rest.body {
        rows.push_str(&format!("\n| REST Body | `{}`", body));
    }
    rows
}
