use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

use qren_fleet::{CommandOption, CommandSchema, OptionKind};

/// Serialize every registered command into Discord's application-command
/// schema for the bulk replace call.
pub fn build_commands(schemas: &[CommandSchema]) -> Vec<CreateCommand> {
    schemas.iter().map(build_command).collect()
}

fn build_command(schema: &CommandSchema) -> CreateCommand {
    let mut command = CreateCommand::new(&schema.name).description(&schema.description);
    for option in &schema.options {
        command = command.add_option(build_option(option));
    }
    command
}

fn build_option(option: &CommandOption) -> CreateCommandOption {
    let mut builder = CreateCommandOption::new(
        option_type(option.kind),
        &option.name,
        &option.description,
    )
    .required(option.required);
    for choice in &option.choices {
        builder = builder.add_string_choice(&choice.name, &choice.value);
    }
    if let Some(min) = option.min_value {
        builder = builder.min_int_value(min as u64);
    }
    if let Some(max) = option.max_value {
        builder = builder.max_int_value(max as u64);
    }
    builder
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Attachment => CommandOptionType::Attachment,
    }
}
