// ==========================================
// SQLite 仓储集成测试
// ==========================================
// 职责: 验证课程/时段持久化、级联删除、目录查询、配置加载
// ==========================================


#[cfg(test)]
mod sqlite_repository_test {
    use tutoring_scheduler::config::{config_keys, ConfigManager, LogFormat, SchedulingConfig};
    use tutoring_scheduler::engine::SchedulingError;
    use tutoring_scheduler::repository::RepositoryError;
    use tutoring_scheduler::{OfferingKind, Slot};

    use crate::test_helpers::{course_request, lesson_request, verified_teacher, SqliteEnv};

    #[test]
    fn test_course_slot_round_trip_preserves_schedule() {
        println!("\n=== 测试：课程时段持久化 ===");
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");

        let created = workflow
            .create(&teacher, &course_request(80.0, 10), false, OfferingKind::Course)
            .unwrap();
        let stored = env
            .stores
            .offerings
            .find_offering(&created.offering_id)
            .unwrap()
            .unwrap();

        for (built, loaded) in created.slots.iter().zip(stored.slots.iter()) {
            let (built, loaded) = (built.as_course().unwrap(), loaded.as_course().unwrap());
            assert_eq!(built.header.slot_id, loaded.header.slot_id);
            assert_eq!(built.header.anchor, loaded.header.anchor);
            assert_eq!(built.days, loaded.days);
            assert_eq!(built.course_days, loaded.course_days);
            assert_eq!(built.hour_code, loaded.hour_code);
            assert_eq!(built.week_length, loaded.week_length);
            assert_eq!(built.themas, loaded.themas);
        }
        println!("✓ 上课日、时刻、课题顺序均保持");
    }

    #[test]
    fn test_lesson_slot_round_trip_keeps_single_topic() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");

        let created = workflow
            .create(&teacher, &lesson_request(30.0), false, OfferingKind::PrivateLesson)
            .unwrap();
        let stored = env
            .stores
            .offerings
            .find_offering(&created.offering_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.kind, OfferingKind::PrivateLesson);
        assert_eq!(stored.slots.len(), 2);
        for slot in &stored.slots {
            let lesson = slot.as_lesson().unwrap();
            assert_eq!(lesson.student, None);
            assert_eq!(
                lesson.thema.as_ref().map(|t| t.title.as_str()),
                Some("Present Perfect")
            );
            assert_eq!(slot.capacity(), 1);
        }
    }

    #[test]
    fn test_delete_offering_cascades_to_slots() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");

        let created = workflow
            .create(&teacher, &course_request(80.0, 10), true, OfferingKind::Course)
            .unwrap();
        let slot_id = created.slots[0].slot_id().to_string();

        env.stores.offerings.delete_offering(&created.offering_id).unwrap();
        assert!(env.stores.slots.find_slot(&slot_id).unwrap().is_none());

        let conn = env.conn.lock().unwrap();
        let themas: i64 = conn
            .query_row("SELECT COUNT(*) FROM thema", [], |row| row.get(0))
            .unwrap();
        assert_eq!(themas, 0);
    }

    #[test]
    fn test_delete_missing_offering_is_not_found() {
        let env = SqliteEnv::new();
        let err = env.stores.offerings.delete_offering("missing").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_enrollment_persists_students_in_order() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");
        let service = env.enrollment();

        let created = workflow
            .create(&teacher, &course_request(80.0, 3), false, OfferingKind::Course)
            .unwrap();
        let slot_id = created.slots[0].slot_id().to_string();
        for student in ["s-b", "s-a", "s-c"] {
            service.enroll(student, &created.offering_id, &slot_id).unwrap();
        }

        let slot: Slot = env.stores.slots.find_slot(&slot_id).unwrap().unwrap();
        assert_eq!(
            slot.enrolled_students(),
            vec!["s-b".to_string(), "s-a".to_string(), "s-c".to_string()]
        );
        assert_eq!(slot.header().revision, 3);
        assert!(slot.is_full());
    }

    #[test]
    fn test_stale_save_keeps_enrollment_popularity() {
        println!("\n=== 测试：过期副本保存不回退热度 ===");
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");
        let service = env.enrollment();

        let created = workflow
            .create(&teacher, &course_request(80.0, 10), false, OfferingKind::Course)
            .unwrap();
        let mut stale = env
            .stores
            .offerings
            .find_offering(&created.offering_id)
            .unwrap()
            .unwrap();
        service
            .enroll("s1", &created.offering_id, created.slots[0].slot_id())
            .unwrap();

        stale.title = "Математика - група Б".to_string();
        env.stores.offerings.save_offering(&stale).unwrap();

        let stored = env
            .stores
            .offerings
            .find_offering(&created.offering_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Математика - група Б");
        assert_eq!(stored.popularity, 1);
        println!("✓ popularity 仅由报名提交递增");
    }

    #[test]
    fn test_delete_slot_refuses_enrolled_slot() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");
        let service = env.enrollment();

        let created = workflow
            .create(&teacher, &course_request(80.0, 10), false, OfferingKind::Course)
            .unwrap();
        let slot_id = created.slots[0].slot_id().to_string();
        service.enroll("s1", &created.offering_id, &slot_id).unwrap();

        // 直接走存储层，绕过工作流中的预检查
        let err = env.stores.slots.delete_slot(&slot_id).unwrap_err();
        assert!(matches!(err, RepositoryError::SlotOccupied { slot_id: ref id } if *id == slot_id));
        assert!(matches!(
            SchedulingError::from(err),
            SchedulingError::SlotNotEmpty { .. }
        ));

        let slot = env.stores.slots.find_slot(&slot_id).unwrap().unwrap();
        assert_eq!(slot.enrolled_students(), vec!["s1".to_string()]);

        let err = env.stores.slots.delete_slot("missing").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        let empty_slot = created.slots[1].slot_id();
        env.stores.slots.delete_slot(empty_slot).unwrap();
        assert!(env.stores.slots.find_slot(empty_slot).unwrap().is_none());
    }

    #[test]
    fn test_catalog_lists_are_distinct_and_sorted() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let teacher = verified_teacher("teacher-1");

        let mut physics = course_request(80.0, 10);
        physics.subject = "Физика".to_string();
        physics.grade = "11".to_string();
        workflow
            .create(&teacher, &physics, false, OfferingKind::Course)
            .unwrap();
        workflow
            .create(&teacher, &course_request(80.0, 10), false, OfferingKind::Course)
            .unwrap();
        workflow
            .create(&teacher, &course_request(80.0, 10), true, OfferingKind::Course)
            .unwrap();

        let subjects = env.stores.offerings.list_subjects().unwrap();
        assert_eq!(subjects, vec!["Математика".to_string(), "Физика".to_string()]);
        let grades = env.stores.offerings.list_grades().unwrap();
        assert_eq!(grades, vec!["11".to_string(), "7".to_string()]);
    }

    #[test]
    fn test_scheduling_config_loaded_from_config_kv() {
        println!("\n=== 测试：从 config_kv 加载排课配置 ===");
        let env = SqliteEnv::new();
        let manager = ConfigManager::from_connection(env.conn.clone()).unwrap();

        let defaults = manager.load_scheduling_config().unwrap();
        assert_eq!(defaults, SchedulingConfig::default());

        manager
            .set_config_value(config_keys::RECORD_PRICE_ON_REPUBLISH, "false")
            .unwrap();
        manager.set_config_value(config_keys::LOG_FORMAT, "json").unwrap();
        let loaded = manager.load_scheduling_config().unwrap();
        assert!(!loaded.record_price_on_republish);
        assert_eq!(loaded.log_format, LogFormat::Json);

        manager
            .set_config_value(config_keys::MIN_DURATION_MINUTES, "half an hour")
            .unwrap();
        let err = manager.load_scheduling_config().unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }
}
