#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use fake::{Fake, Faker};
    use serde_json::json;

    use crate::{
        error::Error,
        model::{
            mock::MockExecutor,
            persona::{find_all, find_by_id, find_most_active, find_relations, Relation},
            Param,
        },
    };

    #[test]
    fn test_find_all() -> Result<(), Error> {
        let username: String = Faker.fake();
        let exec = MockExecutor::new().returns(vec![json!({
            "persona_id": 1,
            "bio": null,
            "username": username,
            "following_count": 2,
            "followers_count": 0,
        })]);

        let found = find_all(&exec)?;
        assert_eq!(1, found.len());
        assert_eq!(username, found[0].username);
        assert_eq!(2, found[0].following_count);
        assert!(exec.calls()[0].params.is_empty());
        Ok(())
    }

    #[test]
    fn test_find_by_id_missing() -> Result<(), Error> {
        let exec = MockExecutor::new();
        assert!(find_by_id(&exec, "42")?.is_none());
        assert_eq!(vec![Param::Text("42".into())], exec.calls()[0].params);
        Ok(())
    }

    #[test]
    fn test_find_by_id_decodes_timestamp() -> Result<(), Error> {
        let exec = MockExecutor::new().returns(vec![json!({
            "persona_id": 3,
            "bio": "likes trains",
            "username": "conductor",
            "created_at": "2024-05-01T08:00:00.5+00:00",
        })]);
        let persona = find_by_id(&exec, "3")?.unwrap();
        assert_eq!(3, persona.persona_id);
        assert_eq!(Some("likes trains".to_string()), persona.bio);
        Ok(())
    }

    #[test]
    fn test_most_active_binds_number() -> Result<(), Error> {
        let exec = MockExecutor::new();
        find_most_active(&exec, 5)?;
        assert_eq!(vec![Param::Int(5)], exec.calls()[0].params);
        Ok(())
    }

    #[test]
    fn test_relation_selects_column() -> Result<(), Error> {
        let exec = MockExecutor::new();
        find_relations(&exec, "7", Relation::Follower)?;
        find_relations(&exec, "7", Relation::Followed)?;
        let calls = exec.calls();
        assert!(calls[0].sql.contains("WHERE f.follower = $1"));
        assert!(calls[0].sql.contains("p.persona_id = f.followed"));
        assert!(calls[1].sql.contains("WHERE f.followed = $1"));
        assert!(calls[1].sql.contains("p.persona_id = f.follower"));
        Ok(())
    }

    #[test]
    fn test_relation_parse() {
        assert_eq!(Relation::Follower, Relation::from_str("follower").unwrap());
        assert_eq!(Relation::Followed, Relation::from_str("followed").unwrap());
        assert!(Relation::from_str("friends").is_err());
        assert!(Relation::from_str("").is_err());
    }
}
