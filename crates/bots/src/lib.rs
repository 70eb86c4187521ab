//! The five Qren bot personas and their slash-command surfaces.
//!
//! Command bodies follow one contract: reply through the interaction
//! context, touch persisted state only through the shared handle, and
//! return an error for anything unexpected (the router owns failure
//! handling and the user-visible error reply).

pub mod avatar;
pub mod console;
pub mod control;
pub mod publish;
pub mod tags;

use {
    qren_config::{Identity, IdentityDef},
    qren_fleet::{CommandContext, CommandDescriptor, IdentityRuntime, ReplyMessage},
};

/// Embed accent colors shared across the bots.
pub(crate) mod palette {
    pub const BLUE: u32 = 0x3498db;
    pub const GREEN: u32 = 0x27ae60;
    pub const RED: u32 = 0xe74c3c;
    pub const PURPLE: u32 = 0x9b59b6;
    pub const GRAY: u32 = 0x36393f;
}

/// The static bot table: name, credential variable, presence text, and the
/// command surface each persona exposes.
fn surfaces() -> [(IdentityDef, fn() -> Vec<CommandDescriptor>); 5] {
    [
        (
            IdentityDef {
                name: "Avatar Bot",
                credential_env: "DISCORD_BOT_TOKEN",
                activity: "for avatar requests",
            },
            avatar::commands,
        ),
        (
            IdentityDef {
                name: "Control Bot",
                credential_env: "CONTROL_BOT_TOKEN",
                activity: "control panel",
            },
            control::commands,
        ),
        (
            IdentityDef {
                name: "Console Bot",
                credential_env: "CONSOLE_BOT_TOKEN",
                activity: "system monitoring",
            },
            console::commands,
        ),
        (
            IdentityDef {
                name: "Publishing Bot",
                credential_env: "PUBLISHING_BOT_TOKEN",
                activity: "server promotions",
            },
            publish::commands,
        ),
        (
            IdentityDef {
                name: "Tag Search Bot",
                credential_env: "TAG_SEARCH_BOT_TOKEN",
                activity: "tag lookups",
            },
            tags::commands,
        ),
    ]
}

/// Every configured identity with its command surface, credentials resolved
/// from the process environment. Identities without a credential are still
/// listed; the orchestrator skips them at startup.
pub fn identities() -> Vec<IdentityRuntime> {
    surfaces()
        .into_iter()
        .map(|(def, commands)| IdentityRuntime {
            identity: Identity::resolve(&def),
            commands: commands(),
        })
        .collect()
}

/// Admin gate shared by privileged commands: refuses with an ephemeral
/// reply and reports whether the handler may continue.
pub(crate) async fn require_admin(ctx: &CommandContext, denial: &str) -> anyhow::Result<bool> {
    if ctx.actor.is_admin {
        return Ok(true);
    }
    ctx.reply(ReplyMessage::ephemeral(denial)).await?;
    Ok(false)
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, std::collections::HashSet};

    #[test]
    fn five_identities_are_defined() {
        let identities = identities();
        assert_eq!(identities.len(), 5);
        let names: Vec<_> = identities.iter().map(|r| r.identity.name.as_str()).collect();
        assert!(names.contains(&"Avatar Bot"));
        assert!(names.contains(&"Tag Search Bot"));
    }

    #[test]
    fn every_surface_has_unique_command_names() {
        for runtime in identities() {
            let mut seen = HashSet::new();
            for descriptor in &runtime.commands {
                assert!(
                    seen.insert(descriptor.name.clone()),
                    "duplicate command {} on {}",
                    descriptor.name,
                    runtime.identity.name
                );
            }
            assert!(!runtime.commands.is_empty());
        }
    }
}
