// ABOUTME: Email template for sending a document version to a client
// ABOUTME: Recipient name and document number are HTML-escaped

use robodesk_core::utils::filename_segment;
use robodesk_core::{escape_html, DocumentKind};
use robodesk_notifications::{Attachment, OutgoingEmail};

pub(crate) struct DocumentMail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub recipient_name: Option<&'a str>,
    pub kind: DocumentKind,
    pub document_number: &'a str,
    pub version_number: i64,
}

pub(crate) fn document_email(mail: &DocumentMail<'_>, pdf: Vec<u8>) -> OutgoingEmail {
    let kind = mail.kind.title();
    let subject = format!(
        "{} {} (version {})",
        kind, mail.document_number, mail.version_number
    );

    let greeting = match mail.recipient_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => format!("Dear {},", escape_html(name)),
        None => "Hello,".to_string(),
    };

    let html = format!(
        "<html><body style=\"font-family:Arial,sans-serif;color:#1f2328\">\
         <p>{}</p>\
         <p>Please find attached {} <strong>{}</strong>, version {}.</p>\
         <p>Do not hesitate to contact us if you have any questions.</p>\
         </body></html>",
        greeting,
        kind.to_lowercase(),
        escape_html(mail.document_number),
        mail.version_number
    );

    let filename = format!(
        "{}_v{}.pdf",
        filename_segment(mail.document_number),
        mail.version_number
    );

    OutgoingEmail {
        from: mail.from.to_string(),
        to: mail.to.to_string(),
        subject,
        html,
        attachments: vec![Attachment::pdf(filename, pdf)],
    }
}
