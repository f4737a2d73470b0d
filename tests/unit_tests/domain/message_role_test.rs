use zakchat::domain::MessageRole;

#[test]
fn given_known_roles_when_parsing_then_round_trips_through_as_str() {
    for role in [MessageRole::User, MessageRole::Assistant] {
        assert_eq!(role.as_str().parse::<MessageRole>(), Ok(role));
    }
}

#[test]
fn given_system_role_when_parsing_then_fails() {
    assert!("system".parse::<MessageRole>().is_err());
}

#[test]
fn given_uppercase_role_when_parsing_then_fails() {
    assert!("USER".parse::<MessageRole>().is_err());
}
