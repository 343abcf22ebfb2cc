//! Plain text renderings of API models.

use pluralkit::model::{Group, Member, Message, Switch, SwitchMembers, System};

fn id_or_draft<T: ToString>(id: &Option<T>) -> String {
    id.as_ref().map_or_else(|| "-----".to_string(), ToString::to_string)
}

pub fn system(system: &System) -> String {
    let mut out = format!("{} {}", system.id, system.name.as_deref().unwrap_or("(unnamed)"));
    if let Some(tag) = &system.tag {
        out.push_str(&format!(" [{tag}]"));
    }
    if let Some(pronouns) = &system.pronouns {
        out.push_str(&format!("\npronouns: {pronouns}"));
    }
    if let Some(timezone) = &system.timezone {
        out.push_str(&format!("\ntime zone: {timezone}"));
    }
    if let Some(created) = &system.created {
        out.push_str(&format!("\ncreated: {created}"));
    }
    if let Some(description) = &system.description {
        out.push_str(&format!("\n\n{description}"));
    }
    out
}

pub fn member(member: &Member) -> String {
    let mut out = format!("{} {}", id_or_draft(&member.id), member.shown_name());
    if let Some(pronouns) = &member.pronouns {
        out.push_str(&format!(" ({pronouns})"));
    }
    if !member.proxy_tags.is_empty() {
        let tags: Vec<String> = member.proxy_tags.iter().map(ToString::to_string).collect();
        out.push_str(&format!("  {}", tags.join(" ")));
    }
    out
}

pub fn group(group: &Group) -> String {
    let mut out = format!(
        "{} {}",
        id_or_draft(&group.id),
        group.display_name.as_deref().unwrap_or(&group.name)
    );
    if let Some(members) = &group.members {
        out.push_str(&format!(" ({} members)", members.len()));
    }
    out
}

pub fn switch(switch: &Switch) -> String {
    let names: Vec<String> = match &switch.members {
        SwitchMembers::Members(members) => members.iter().map(|m| m.shown_name().to_string()).collect(),
        SwitchMembers::Ids(ids) => ids.iter().map(ToString::to_string).collect(),
    };
    if names.is_empty() {
        format!("{} (switched out)", switch.timestamp)
    } else {
        format!("{} {}", switch.timestamp, names.join(", "))
    }
}

pub fn message(message: &Message) -> String {
    let mut out = format!("message {} in channel {}", message.id, message.channel);
    if let Some(original) = message.original {
        out.push_str(&format!(" (original {original})"));
    }
    out.push_str(&format!("\nsent by {} at {}", message.sender, message.timestamp));
    match (&message.system, &message.member) {
        (Some(system), Some(member)) => {
            out.push_str(&format!("\nproxied as {} of {}", member.shown_name(), system.id));
        }
        (Some(system), None) => {
            out.push_str(&format!("\nsystem {}", system.id));
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use pluralkit::model::FromWire;
    use pluralkit::ApiVersion;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_member_line() {
        let member = Member::from_wire(
            json!({
                "id": "gaznz",
                "name": "Myriad",
                "display_name": "Myriad Kit",
                "pronouns": "they/them",
                "proxy_tags": [{ "prefix": "m:", "suffix": null }]
            }),
            ApiVersion::V2,
        )
        .unwrap();
        assert_eq!(self::member(&member), "gaznz Myriad Kit (they/them)  m:text");
        assert_eq!(self::member(&Member::new("Draft")), "----- Draft");
    }

    #[test]
    fn test_system_block() {
        let system = System::from_wire(
            json!({
                "id": "exmpl",
                "name": "Example System",
                "tag": "| ex",
                "pronouns": "they/them",
                "description": "hello",
                "privacy": null
            }),
            ApiVersion::V2,
        )
        .unwrap();
        assert_eq!(
            self::system(&system),
            "exmpl Example System [| ex]\npronouns: they/them\n\nhello"
        );
    }

    #[test]
    fn test_proxied_message() {
        let message = Message::from_wire(
            json!({
                "timestamp": "2021-06-14T01:48:54Z",
                "id": "854173442397503498",
                "sender": "466378653216014359",
                "channel": "466707357099884546",
                "system": { "id": "exmpl", "privacy": null },
                "member": { "id": "gaznz", "name": "Myriad", "privacy": null }
            }),
            ApiVersion::V2,
        )
        .unwrap();
        let text = self::message(&message);
        assert!(text.starts_with("message 854173442397503498 in channel 466707357099884546\nsent by 466378653216014359 at "));
        assert!(text.ends_with("\nproxied as Myriad of exmpl"));
    }

    #[test]
    fn test_switched_out() {
        let switch = Switch::from_wire(
            json!({
                "id": "8f4b2e59-1c1e-4a8e-9c1d-3b2a8e0f6d11",
                "timestamp": "2022-02-02T22:22:22Z",
                "members": []
            }),
            ApiVersion::V2,
        )
        .unwrap();
        assert!(self::switch(&switch).ends_with("(switched out)"));
    }
}
