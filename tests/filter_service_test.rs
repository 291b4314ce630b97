// ==========================================
// 筛选面板与价格统计集成测试
// ==========================================
// 职责: 发布 -> 价格统计 -> 筛选面板/首页推荐 全链路
// ==========================================


#[cfg(test)]
mod filter_service_test {
    use std::sync::Arc;
    use std::thread;

    use tutoring_scheduler::config::SchedulingConfig;
    use tutoring_scheduler::engine::FilterService;
    use tutoring_scheduler::{OfferingKind, PriceStatisticsRegistry};

    use crate::test_helpers::{course_request, lesson_request, verified_teacher, SqliteEnv};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_filters_reflect_published_prices_per_kind() {
        println!("\n=== 测试：筛选面板价格分档 ===");
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let filters = FilterService::new(env.stores.offerings.clone(), env.price_stats.clone());
        let teacher = verified_teacher("teacher-1");

        workflow
            .create(&teacher, &course_request(100.0, 10), false, OfferingKind::Course)
            .unwrap();
        workflow
            .create(&teacher, &course_request(200.0, 10), false, OfferingKind::Course)
            .unwrap();
        // 草稿不计入
        workflow
            .create(&teacher, &course_request(999.0, 10), true, OfferingKind::Course)
            .unwrap();

        let response = filters.filters(OfferingKind::Course).unwrap();
        assert_eq!(response.subjects, vec!["Математика".to_string()]);
        assert_eq!(response.grades, vec!["7".to_string()]);
        assert!(approx(response.prices[0], 116.5));
        assert!(approx(response.prices[2], 150.0));
        assert!(approx(response.prices[4], 183.5));

        let lesson_panel = filters.filters(OfferingKind::PrivateLesson).unwrap();
        assert_eq!(lesson_panel.prices, [0.0; 5]);
        println!("✓ 课程价格分档: {:?}", response.prices);
    }

    #[test]
    fn test_popular_offerings_ordered_by_enrollments() {
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let enrollment = env.enrollment();
        let filters = FilterService::new(env.stores.offerings.clone(), env.price_stats.clone());
        let teacher = verified_teacher("teacher-1");

        let quiet = workflow
            .create(&teacher, &course_request(80.0, 10), false, OfferingKind::Course)
            .unwrap();
        let busy = workflow
            .create(&teacher, &lesson_request(30.0), false, OfferingKind::PrivateLesson)
            .unwrap();
        workflow
            .create(&teacher, &course_request(80.0, 10), true, OfferingKind::Course)
            .unwrap();

        for slot in &busy.slots {
            enrollment
                .enroll("student-1", &busy.offering_id, slot.slot_id())
                .unwrap();
        }

        let popular = filters.popular_offerings(10).unwrap();
        let ids: Vec<&str> = popular.iter().map(|s| s.offering_id.as_str()).collect();
        assert_eq!(ids, vec![busy.offering_id.as_str(), quiet.offering_id.as_str()]);

        let top = &popular[0];
        assert_eq!(top.popularity, 2);
        assert_eq!(top.kind, OfferingKind::PrivateLesson);
        assert_eq!(top.price_per_hour, Some(30.0));
        assert_eq!(top.enrolled_in_first_slot, 0);
        assert_eq!(top.week_length, None);

        let course = &popular[1];
        assert_eq!(course.week_length, Some(2));
        assert_eq!(course.first_date.map(|d| d.to_string()), Some("2026-10-20".to_string()));
    }

    #[test]
    fn test_popular_offerings_limit_skips_offerings_without_slots() {
        println!("\n=== 测试：无时段课程不占推荐名额 ===");
        let env = SqliteEnv::new();
        let workflow = env.workflow(SchedulingConfig::default());
        let enrollment = env.enrollment();
        let filters = FilterService::new(env.stores.offerings.clone(), env.price_stats.clone());
        let teacher = verified_teacher("teacher-1");

        let emptied = workflow
            .create(&teacher, &lesson_request(30.0), false, OfferingKind::PrivateLesson)
            .unwrap();
        let open = workflow
            .create(&teacher, &lesson_request(35.0), false, OfferingKind::PrivateLesson)
            .unwrap();
        enrollment
            .enroll("student-1", &emptied.offering_id, emptied.slots[0].slot_id())
            .unwrap();

        // 编辑重建时段后逐个删除，课程保留热度但不再有时段
        let rebuilt = workflow
            .edit(&teacher, &emptied.offering_id, &lesson_request(30.0), false, OfferingKind::PrivateLesson)
            .unwrap();
        for slot in &rebuilt.slots {
            workflow
                .remove_slot(&teacher, &emptied.offering_id, slot.slot_id())
                .unwrap();
        }
        let stored = env
            .stores
            .offerings
            .find_offering(&emptied.offering_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.popularity, 1);
        assert!(!stored.has_slots());

        let popular = filters.popular_offerings(1).unwrap();
        let ids: Vec<&str> = popular.iter().map(|s| s.offering_id.as_str()).collect();
        assert_eq!(ids, vec![open.offering_id.as_str()]);
        println!("✓ 推荐列表按名额返回有时段的课程");
    }

    #[test]
    fn test_concurrent_recording_loses_no_observation() {
        println!("\n=== 测试：并发记录价格 ===");
        let registry = Arc::new(PriceStatisticsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        registry.record(OfferingKind::PrivateLesson, 20.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot(OfferingKind::PrivateLesson);
        assert_eq!(snapshot.count, 400);
        assert!(approx(snapshot.sum, 8000.0));
        assert!(approx(snapshot.mean, 20.0));
        assert_eq!(registry.snapshot(OfferingKind::Course).count, 0);
    }
}
