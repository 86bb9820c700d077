use keebot_vault::*;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const ROOT_ID: &str = "AAECAwQFBgcICQoLDA0ODw==";
const MAIL_ID: &str = "EBESExQVFhcYGRobHB0eHw==";
const SITE_ID: &str = "ICEiIyQlJicoKSorLC0uLw==";
const GMAIL_ID: &str = "MDEyMzQ1Njc4OTo7PD0+Pw==";

const VAULT: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<KeePassFile>
    <Meta>
        <Generator>KeePass</Generator>
        <DatabaseName>Personal</DatabaseName>
    </Meta>
    <Root>
        <Group>
            <UUID>AAECAwQFBgcICQoLDA0ODw==</UUID>
            <Name>Root</Name>
            <Notes>kept in memory only</Notes>
            <IconID>48</IconID>
            <Times>
                <CreationTime>2017-01-01T00:00:00Z</CreationTime>
            </Times>
            <Entry>
                <UUID>ICEiIyQlJicoKSorLC0uLw==</UUID>
                <IconID>0</IconID>
                <String><Key>Title</Key><Value>site</Value></String>
                <String><Key>Password</Key><Value>x</Value></String>
            </Entry>
            <Group>
                <UUID>EBESExQVFhcYGRobHB0eHw==</UUID>
                <Name>Mail</Name>
                <IconID>37</IconID>
                <Entry>
                    <UUID>MDEyMzQ1Njc4OTo7PD0+Pw==</UUID>
                    <IconID>1</IconID>
                    <String><Key>Title</Key><Value>Gmail</Value></String>
                    <String><Key>UserName</Key><Value>me</Value></String>
                    <String><Key>Password</Key><Value>old</Value></String>
                </Entry>
            </Group>
        </Group>
    </Root>
</KeePassFile>"#;

const SINGLE_ENTRY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<KeePassFile>
    <Meta/>
    <Root>
        <Group>
            <UUID>AAECAwQFBgcICQoLDA0ODw==</UUID>
            <Name>Root</Name>
            <IconID>48</IconID>
            <Entry>
                <UUID>ICEiIyQlJicoKSorLC0uLw==</UUID>
                <String><Key>Title</Key><Value>site</Value></String>
                <String><Key>Password</Key><Value>x</Value></String>
            </Entry>
        </Group>
    </Root>
</KeePassFile>"#;

fn create_vault_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn create_session(file: &NamedTempFile, store: Box<dyn UserStore>) -> VaultSession {
    VaultSession::new(
        1,
        file.path(),
        VaultSettings::default(),
        Box::new(XmlFileContainer::new()),
        store,
    )
}

fn open_session(file: &NamedTempFile) -> VaultSession {
    let store = MemoryUserStore::new().with_record(UserRecord::new(1));
    let mut session = create_session(file, Box::new(store));
    session.open(None, None).unwrap();
    session
}

fn key_of(session: &VaultSession, id: &str) -> NodeKey {
    session.get_item_by_uuid(id).unwrap().unwrap()
}

#[test]
fn test_add_entry_under_root() {
    let file = create_vault_file(SINGLE_ENTRY);
    let mut session = open_session(&file);
    let root = session.tree().unwrap().root();
    assert_eq!(session.tree().unwrap().size(root), 1);

    session.start_add_edit(DraftTarget::Add(ItemKind::Entry)).unwrap();
    session.handle_text("new").unwrap();
    session.handle_command("create_Password").unwrap();
    session.handle_text("pw12345a").unwrap();
    session.handle_command("create_done").unwrap();

    let tree = session.tree().unwrap();
    assert_eq!(tree.size(root), 2);
    let added = tree.children(root)[1];
    assert_eq!(tree.entry_name(added), "new");
    assert_eq!(tree.active(), root);
    assert!(session.draft().is_none());
}

#[test]
fn test_delete_only_child_entry() {
    let file = create_vault_file(VAULT);
    let mut session = open_session(&file);

    session.handle_command(MAIL_ID).unwrap();
    session.handle_command(GMAIL_ID).unwrap();
    session.handle_command("Delete").unwrap();
    session.handle_command("ReallyDelete").unwrap();

    let mail = key_of(&session, MAIL_ID);
    let tree = session.tree().unwrap();
    assert_eq!(tree.size(mail), 0);
    assert_eq!(tree.active(), mail);
    assert_eq!(session.get_item_by_uuid(GMAIL_ID).unwrap(), None);
}

#[test]
fn test_persisted_bytes_round_trip() {
    let file = create_vault_file(VAULT);
    let dir = tempdir().unwrap();
    let users = dir.path().join("users.json");

    let mut store = JsonFileUserStore::new(&users);
    store.save(&UserRecord::new(1)).unwrap();
    let mut session = create_session(&file, Box::new(store));
    session.open(None, None).unwrap();

    session.handle_command(&format!("Edit_{ROOT_ID}")).unwrap();
    session.handle_command("create_done").unwrap();

    let reloaded = JsonFileUserStore::new(&users).load(1).unwrap().unwrap();
    assert!(reloaded.is_opened);
    let bytes = reloaded.file.unwrap();

    let before = decode_document(VAULT, &VaultSettings::default()).unwrap();
    let after = decode_document(std::str::from_utf8(&bytes).unwrap(), &VaultSettings::default()).unwrap();
    let (a, b) = (&before.tree, &after.tree);

    let ids = |t: &VaultTree| -> Vec<(String, String, usize)> {
        t.walk(t.root())
            .into_iter()
            .map(|k| (t.get(k).unwrap().id.clone(), t.name(k), t.size(k)))
            .collect()
    };
    assert_eq!(ids(a), ids(b));

    let gmail_a = a.get_item_by_uuid(GMAIL_ID).unwrap();
    let gmail_b = b.get_item_by_uuid(GMAIL_ID).unwrap();
    assert_eq!(a.get_item(gmail_a, FIELD_USERNAME), b.get_item(gmail_b, FIELD_USERNAME));
    assert_eq!(a.entry(gmail_a).unwrap().icon_id, b.entry(gmail_b).unwrap().icon_id);

    // Known lossy fields: group notes are not written back, and every
    // bookkeeping time is restamped at encode.
    assert_eq!(a.group(a.root()).unwrap().notes, "kept in memory only");
    assert_eq!(b.group(b.root()).unwrap().notes, "");
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(!text.contains("2017-01-01T00:00:00Z"));
    assert_eq!(text.matches("<CreationTime>").count(), 4);
}

#[test]
fn test_edit_search_result_updates_canonical_entry() {
    let file = create_vault_file(VAULT);
    let mut session = open_session(&file);

    session.handle_text("gmail").unwrap();
    let tree = session.tree().unwrap();
    let overlay = tree.search_group().unwrap();
    let proxy = tree.children(overlay)[0];
    let proxy_id = tree.get(proxy).unwrap().id.clone();
    assert_ne!(proxy_id, GMAIL_ID);

    session.handle_command(&proxy_id).unwrap();
    session.handle_command(&format!("Edit_{proxy_id}")).unwrap();
    session.handle_command("create_Password").unwrap();
    session.handle_text("new-secret").unwrap();
    session.handle_command("create_done").unwrap();

    session.handle_command("Back").unwrap();
    let gmail = key_of(&session, GMAIL_ID);
    let tree = session.tree().unwrap();
    assert!(tree.search_group().is_none());
    assert_eq!(
        tree.get_item(gmail, FIELD_PASSWORD).unwrap().value.as_deref(),
        Some("new-secret")
    );
}

#[test]
fn test_generate_password_keeps_cursor() {
    let file = create_vault_file(VAULT);
    let mut session = open_session(&file);

    session.handle_command(&format!("Edit_{SITE_ID}")).unwrap();
    session.handle_command("create_URL").unwrap();
    session.handle_command("create_generate_password").unwrap();

    let draft = session.draft().unwrap();
    assert_eq!(draft.current_field(), FIELD_URL);
    let password = draft.value(FIELD_PASSWORD).unwrap();
    assert_eq!(password.len(), 8);
    assert_ne!(password, "x");
}

#[test]
fn test_paging_with_settings_file() {
    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");
    std::fs::write(&settings_path, r#"{"page_length": 1, "search_group_name": "Found"}"#).unwrap();
    let settings = VaultSettings::load(&settings_path).unwrap();

    let file = create_vault_file(VAULT);
    let store = MemoryUserStore::new().with_record(UserRecord::new(1));
    let mut session = VaultSession::new(1, file.path(), settings, Box::new(XmlFileContainer::new()), Box::new(store));
    session.open(None, None).unwrap();

    let CommandOutcome::Render(view) = session.handle_command("Right").unwrap() else {
        panic!("expected a render");
    };
    assert!(view.text.contains("Page 2 of 2"));
    assert!(view.callbacks().contains(&MAIL_ID));
    assert!(!view.callbacks().contains(&SITE_ID));

    session.handle_command("Right").unwrap();
    let root = session.tree().unwrap().root();
    assert_eq!(session.tree().unwrap().page(root), 1);

    session.handle_text("mail").unwrap();
    let tree = session.tree().unwrap();
    assert_eq!(tree.name(tree.active()), "Found");
}

#[test]
fn test_download_and_lock() {
    let file = create_vault_file(VAULT);
    let mut session = open_session(&file);

    match session.handle_command("Download").unwrap() {
        CommandOutcome::Download { file_name, bytes } => {
            assert_eq!(file_name, "Root.kdbx");
            assert!(!bytes.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.handle_command("Lock").unwrap(), CommandOutcome::Locked);
    assert_eq!(session.tree().unwrap_err(), VaultError::NotOpen);
}

#[test]
fn test_open_failures_use_stable_messages() {
    let file = create_vault_file(VAULT);
    let store = MemoryUserStore::new().with_record(UserRecord::new(1));
    let mut session = VaultSession::new(
        1,
        file.path(),
        VaultSettings::default(),
        Box::new(XmlFileContainer::with_password("right")),
        Box::new(store),
    );
    let err = session.open(Some("wrong"), None).unwrap_err();
    assert_eq!(err.to_string(), "Master password or key-file wrong");
    assert!(!session.is_open());

    let garbage = create_vault_file("<KeePassFile><Root></Root></KeePassFile>");
    let store = MemoryUserStore::new().with_record(UserRecord::new(1));
    let mut session = create_session(&garbage, Box::new(store));
    let err = session.open(None, None).unwrap_err();
    assert_eq!(err.to_string(), "Critical error, please report to administrator.");
}
