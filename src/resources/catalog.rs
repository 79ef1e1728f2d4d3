//! Built-in resource catalog.

use std::time::Duration;

use super::{
    ClearPath, CreatePath, DeletePath, Endpoints, FieldSpec, FindPath, ListPath, ResourceSpec,
    UpdateStyle,
};
use crate::gateway::RetryPolicy;

/// Conventions of the older "save/update/find/delete" style controllers.
fn verb_style() -> Endpoints {
    Endpoints {
        list: ListPath::All,
        find: FindPath::Find,
        create: CreatePath::Save,
        update: UpdateStyle::BodyIdUpdate,
        delete: DeletePath::Delete,
        clear: ClearPath::DeleteAll,
    }
}

/// Conventions of the billing-side controllers.
fn billing_style() -> Endpoints {
    Endpoints {
        list: ListPath::List,
        find: FindPath::Get,
        create: CreatePath::Root,
        update: UpdateStyle::PathId,
        delete: DeletePath::Id,
        clear: ClearPath::Clear,
    }
}

/// Every resource the dashboard manages.
pub fn catalog() -> Vec<ResourceSpec> {
    vec![
        // Chat widget settings
        ResourceSpec::new("tags", "Tags")
            .field(FieldSpec::text("tag", "Tag").required().max_len(64))
            .field(FieldSpec::boolean("isDefault", "Default"))
            .column("createdAt"),
        ResourceSpec::new("webhooks", "Webhooks")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::url("url", "Target URL").required())
            .field(FieldSpec::choice(
                "event",
                "Event",
                &["chat_started", "chat_ended", "ticket_created", "visitor_message"],
            ).required())
            .field(FieldSpec::boolean("active", "Active")),
        ResourceSpec::new("greetings", "Greetings")
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::long_text("message", "Message").required())
            .field(FieldSpec::number("delaySeconds", "Delay (s)"))
            .field(FieldSpec::boolean("enabled", "Enabled")),
        ResourceSpec::new("knowledge-base", "Knowledge base articles")
            .with_path("/knowledge-base")
            .with_endpoints(verb_style())
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::text("category", "Category"))
            .field(FieldSpec::long_text("content", "Content").required())
            .field(FieldSpec::tags("keywords", "Keywords")),
        ResourceSpec::new("queued-messages", "Queued messages")
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::long_text("message", "Message").required())
            .field(FieldSpec::number("waitSeconds", "Wait (s)").positive())
            .proxied(),
        ResourceSpec::new("canned-responses", "Canned responses")
            .field(FieldSpec::text("shortcut", "Shortcut").required())
            .field(FieldSpec::long_text("message", "Message").required()),
        ResourceSpec::new("departments", "Departments")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::email("email", "Email"))
            .field(FieldSpec::boolean("isDefault", "Default")),
        ResourceSpec::new("operators", "Operators")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::email("email", "Email").required())
            .field(FieldSpec::choice("role", "Role", &["Owner", "Admin", "Agent"]).required())
            .field(FieldSpec::number("maxChats", "Max chats").positive()),
        ResourceSpec::new("banned-ips", "Banned IPs")
            .field(FieldSpec::ip("ip", "IP address").required())
            .field(FieldSpec::text("reason", "Reason"))
            .column("createdAt"),
        ResourceSpec::new("widget-settings", "Widget settings")
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::color("primaryColor", "Primary color").required())
            .field(FieldSpec::color("textColor", "Text color"))
            .field(FieldSpec::choice("position", "Position", &["left", "right"])),
        ResourceSpec::new("triggers", "Triggers")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::choice("condition", "Condition", &["page_url", "time_on_page", "visits"]).required())
            .field(FieldSpec::text("value", "Value").required())
            .field(FieldSpec::long_text("message", "Message").required()),
        ResourceSpec::new("offline-messages", "Offline messages")
            .field(FieldSpec::text("name", "Visitor name").required())
            .field(FieldSpec::email("email", "Email").required())
            .field(FieldSpec::long_text("message", "Message").required())
            .column("createdAt"),
        ResourceSpec::new("chat-ratings", "Chat ratings")
            .field(FieldSpec::number("rating", "Rating").required().positive())
            .field(FieldSpec::long_text("comment", "Comment")),
        ResourceSpec::new("visitor-notes", "Visitor notes")
            .field(FieldSpec::text("visitorId", "Visitor").required())
            .field(FieldSpec::long_text("note", "Note").required()),
        ResourceSpec::new("eye-catchers", "Eye catchers")
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::url("imageUrl", "Image URL").required())
            .field(FieldSpec::color("backgroundColor", "Background"))
            .proxied(),
        ResourceSpec::new("default-avatars", "Default avatars")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::url("imageUrl", "Image URL").required())
            .proxied(),
        ResourceSpec::new("avatar-templates", "Avatar templates")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::url("imageUrl", "Image URL").required())
            .field(FieldSpec::choice("gender", "Gender", &["male", "female", "neutral"]))
            .with_retry(RetryPolicy::new(3, Duration::from_secs(1))),
        ResourceSpec::new("auto-messages", "Auto messages")
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::long_text("message", "Message").required())
            .field(FieldSpec::number("afterSeconds", "After (s)").positive()),
        ResourceSpec::new("business-hours", "Business hours")
            .field(FieldSpec::choice(
                "day",
                "Day",
                &["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"],
            ).required())
            .field(FieldSpec::text("opensAt", "Opens at").required())
            .field(FieldSpec::text("closesAt", "Closes at").required()),
        ResourceSpec::new("languages", "Languages")
            .field(FieldSpec::text("code", "Code").required().max_len(8))
            .field(FieldSpec::text("name", "Name").required()),
        // Accounts
        ResourceSpec::new("websites", "Websites")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::url("domain", "Domain").required())
            .field(FieldSpec::boolean("active", "Active")),
        ResourceSpec::new("users", "Users")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::email("email", "Email").required())
            .field(FieldSpec::choice("status", "Status", &["Active", "Suspended"]))
            .column("createdAt")
            .server_search(),
        ResourceSpec::new("companies", "Companies")
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::url("website", "Website")),
        ResourceSpec::new("api-keys", "API keys")
            .field(FieldSpec::text("label", "Label").required())
            .field(FieldSpec::datetime("expiresAt", "Expires at")),
        // Billing
        ResourceSpec::new("billing-plans", "Billing plans")
            .with_path("/billing/plans")
            .with_endpoints(billing_style())
            .field(FieldSpec::text("name", "Name").required())
            .field(FieldSpec::number("price", "Price").required().positive())
            .field(FieldSpec::text("currency", "Currency").required().max_len(3))
            .server_search(),
        ResourceSpec::new("subscriptions", "Subscriptions")
            .with_endpoints(billing_style())
            .field(FieldSpec::number("planId", "Plan").required().positive())
            .field(FieldSpec::choice("status", "Status", &["Active", "Cancelled", "PastDue"]).required())
            .server_search(),
        ResourceSpec::new("invoices", "Invoices")
            .with_endpoints(billing_style())
            .field(FieldSpec::text("number", "Number").required())
            .field(FieldSpec::number("amount", "Amount").required().positive())
            .field(FieldSpec::text("currency", "Currency").required())
            .field(FieldSpec::choice("status", "Status", &["Draft", "Paid", "Refunded", "Void"]).required())
            .field(
                FieldSpec::long_text("cancellationReason", "Cancellation reason")
                    .required_when("status", "Refunded"),
            )
            .column("createdAt")
            .server_search(),
        ResourceSpec::new("payments", "Payments")
            .with_endpoints(billing_style())
            .field(FieldSpec::number("amount", "Amount").required().positive())
            .field(FieldSpec::text("currency", "Currency").required())
            .field(FieldSpec::choice("status", "Status", &["Pending", "Completed", "Refunded", "Failed"]).required())
            .field(
                FieldSpec::long_text("cancellationReason", "Cancellation reason")
                    .required_when("status", "Refunded"),
            )
            .with_page_size(5)
            .server_search(),
        ResourceSpec::new("coupons", "Coupons")
            .field(FieldSpec::text("code", "Code").required())
            .field(FieldSpec::number("percentOff", "Percent off").required().positive())
            .field(FieldSpec::datetime("expiresAt", "Expires at")),
        ResourceSpec::new("mail-templates", "Mail templates")
            .with_endpoints(verb_style())
            .field(FieldSpec::text("title", "Title").required())
            .field(FieldSpec::text("subject", "Subject").required())
            .field(FieldSpec::long_text("body", "Body").required())
            .server_search(),
    ]
}

/// Look up a catalog resource by name.
pub fn find_resource(name: &str) -> Option<ResourceSpec> {
    catalog().into_iter().find(|r| r.name == name)
}
