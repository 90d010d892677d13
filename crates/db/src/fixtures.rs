use chrono::{Duration, Utc};
use tracing::info;

use chatdesk_core::access::Role;
use chatdesk_core::domain::chat::{ChatMessage, MessageDirection};
use chatdesk_core::domain::contact::{Contact, ContactId};
use chatdesk_core::domain::settings::BotSettings;
use chatdesk_core::domain::team::{NewTeamUser, TeamUser};
use chatdesk_core::prompt::{
    BranchInfo, CompanyInfo, ExampleItem, PromptData, RuleItem,
};

use crate::connection::DbPool;
use crate::repositories::{
    ChatRepository, ContactRepository, RepositoryError, SettingsRepository, SqlChatRepository,
    SqlContactRepository, SqlSettingsRepository, SqlTeamUserRepository, TeamUserRepository,
};

/// Demo contacts with a short scripted conversation each.
const DEMO_CONTACTS: &[DemoContact] = &[
    DemoContact {
        id: "contact-demo-001",
        phone: "+5491155550001",
        name: "Lucía Fernández",
        tags: &["cliente", "mayorista"],
        chat: &[
            (MessageDirection::Inbound, "Hola, ¿a qué hora abren el sábado?"),
            (MessageDirection::Outbound, "¡Hola Lucía! Los sábados abrimos de 9 a 13 h."),
        ],
    },
    DemoContact {
        id: "contact-demo-002",
        phone: "+5491155550002",
        name: "Pedro Gómez",
        tags: &["prospecto"],
        chat: &[
            (MessageDirection::Inbound, "¿Hacen envíos a Rosario?"),
            (MessageDirection::Outbound, "Sí, enviamos a todo el país en 48 a 72 h."),
            (MessageDirection::Inbound, "Perfecto, gracias."),
        ],
    },
];

struct DemoContact {
    id: &'static str,
    phone: &'static str,
    name: &'static str,
    tags: &'static [&'static str],
    chat: &'static [(MessageDirection, &'static str)],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub admin_created: bool,
    pub prompt_created: bool,
    pub contacts_created: usize,
    pub messages_created: usize,
}

/// Inserts the demo admin, prompt, contacts and chats. Existing rows are left
/// untouched, so running it twice is a no-op.
pub async fn seed_demo(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &str,
) -> Result<SeedSummary, RepositoryError> {
    let users = SqlTeamUserRepository::new(pool.clone());
    let settings = SqlSettingsRepository::new(pool.clone());
    let contacts = SqlContactRepository::new(pool.clone());
    let chats = SqlChatRepository::new(pool.clone());
    let mut summary = SeedSummary::default();

    if users.find_by_email(admin_email).await?.is_none() {
        let admin = TeamUser::create(NewTeamUser {
            email: admin_email.to_string(),
            display_name: "Administrador".to_string(),
            role: Role::Admin,
            password: admin_password.to_string(),
        })?;
        users.create(admin).await?;
        summary.admin_created = true;
    }

    if settings.load().await?.is_none() {
        settings.save(BotSettings::from_prompt(&demo_prompt(), None)).await?;
        summary.prompt_created = true;
    }

    for demo in DEMO_CONTACTS {
        let id = ContactId(demo.id.to_string());
        if contacts.find_by_id(&id).await?.is_some() {
            continue;
        }

        let mut contact = Contact::new(demo.id, demo.phone, demo.name);
        contact.tags = demo.tags.iter().map(|tag| tag.to_string()).collect();
        contacts.save(contact).await?;
        summary.contacts_created += 1;

        let start = Utc::now() - Duration::minutes(demo.chat.len() as i64);
        for (offset, (direction, body)) in demo.chat.iter().enumerate() {
            let mut message = ChatMessage::new(id.clone(), *direction, *body);
            message.sent_at = start + Duration::minutes(offset as i64);
            chats.append(message).await?;
            summary.messages_created += 1;
        }
    }

    info!(
        event_name = "db.seed.demo_completed",
        admin_created = summary.admin_created,
        prompt_created = summary.prompt_created,
        contacts_created = summary.contacts_created,
        messages_created = summary.messages_created,
        "demo seed completed"
    );

    Ok(summary)
}

pub fn demo_prompt() -> PromptData {
    PromptData {
        role: "Sos el asistente virtual de Panadería La Espiga.".to_string(),
        purpose: "Responder consultas de clientes por WhatsApp y tomar pedidos.".to_string(),
        core_rules: vec![
            RuleItem::new("Respondé siempre en español."),
            RuleItem::new("No inventes precios."),
        ],
        behavior_rules: vec![RuleItem::new("Usá un tono cálido y breve.")],
        negative_prompt: "No hables de política.".to_string(),
        tools: String::new(),
        company: CompanyInfo {
            about: "Panadería artesanal fundada en 1998.".to_string(),
            services: vec!["Panificados".to_string(), "Pastelería".to_string()],
        },
        branches: vec![BranchInfo {
            label: "Casa Central".to_string(),
            manager: "Marta Ruiz".to_string(),
            phones: vec!["+54 11 5555-0000".to_string()],
            address: "Av. Corrientes 1234, CABA".to_string(),
            hours: "Lun a Sáb 8 a 20 h".to_string(),
            ..BranchInfo::default()
        }],
        examples: vec![ExampleItem::new(
            "¿Tienen pan sin TACC?",
            "Sí, todos los días tenemos pan sin TACC en Casa Central.",
        )],
    }
}
