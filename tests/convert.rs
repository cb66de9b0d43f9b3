//! End-to-end conversion tests.

use pretty_assertions::assert_eq;
use radroach::sql::{LexError, Position};
use radroach::{ConversionOptions, ConvertError, MapError, convert, convert_dump};

fn enum_to_check() -> ConversionOptions {
    ConversionOptions {
        enum_to_check: true,
        ..Default::default()
    }
}

fn run(sql: &str, options: ConversionOptions) -> String {
    let output = convert(sql.as_bytes(), &options).unwrap();
    String::from_utf8(output).unwrap()
}

const SHOP_DUMP: &str = r#"-- MySQL dump 10.13  Distrib 8.0.33, for Linux (x86_64)
--
-- Host: localhost    Database: shop
-- ------------------------------------------------------
-- Server version	8.0.33

/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;
/*!40101 SET NAMES utf8mb4 */;
/*!40014 SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0 */;

--
-- Table structure for table `customers`
--

DROP TABLE IF EXISTS `customers`;
/*!40101 SET @saved_cs_client     = @@character_set_client */;
/*!50503 SET character_set_client = utf8mb4 */;
CREATE TABLE `customers` (
  `id` int unsigned NOT NULL AUTO_INCREMENT,
  `email` varchar(255) COLLATE utf8mb4_unicode_ci NOT NULL,
  `tier` enum('free','pro') NOT NULL DEFAULT 'free',
  `active` tinyint(1) NOT NULL DEFAULT '1',
  `created_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,
  PRIMARY KEY (`id`),
  UNIQUE KEY `customers_email` (`email`)
) ENGINE=InnoDB AUTO_INCREMENT=3 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
/*!40101 SET character_set_client = @saved_cs_client */;

--
-- Dumping data for table `customers`
--

LOCK TABLES `customers` WRITE;
/*!40000 ALTER TABLE `customers` DISABLE KEYS */;
INSERT INTO `customers` VALUES (1,'ann@example.com','pro',1,'2023-01-01 10:00:00'),(2,'o\'brien@example.com','free',0,'2023-01-02 11:30:00');
/*!40000 ALTER TABLE `customers` ENABLE KEYS */;
UNLOCK TABLES;
/*!40101 SET CHARACTER_SET_CLIENT=@OLD_CHARACTER_SET_CLIENT */;

-- Dump completed on 2023-06-01 12:00:00
"#;

const SHOP_CRDB: &str = r#"-- MySQL dump 10.13  Distrib 8.0.33, for Linux (x86_64)
--
-- Host: localhost    Database: shop
-- ------------------------------------------------------
-- Server version	8.0.33
--
-- Table structure for table `customers`
--
DROP TABLE IF EXISTS customers;
CREATE SEQUENCE IF NOT EXISTS customers_id_seq START WITH 3;
CREATE TABLE customers (
    id INT8 NOT NULL DEFAULT nextval('customers_id_seq'),
    email VARCHAR(255) NOT NULL,
    tier STRING NOT NULL DEFAULT 'free',
    active BOOL NOT NULL DEFAULT '1',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (id),
    CONSTRAINT customers_email UNIQUE (email),
    CONSTRAINT customers_tier_check CHECK (tier IN ('free', 'pro'))
);
--
-- Dumping data for table `customers`
--
INSERT INTO customers VALUES (1,'ann@example.com','pro',1,'2023-01-01 10:00:00'),(2,'o''brien@example.com','free',0,'2023-01-02 11:30:00');
-- Dump completed on 2023-06-01 12:00:00
"#;

#[test]
fn test_full_mysqldump() {
    assert_eq!(run(SHOP_DUMP, enum_to_check()), SHOP_CRDB);
}

#[test]
fn test_converted_dump_is_stable() {
    let once = run(SHOP_DUMP, enum_to_check());
    let twice = run(&once, enum_to_check());
    assert_eq!(twice, once);
}

#[test]
fn test_mixed_case_identifiers_are_stable() {
    let sql = "CREATE TABLE `Orders` (`Status` ENUM('a','b'), `Qty` int, CONSTRAINT ck CHECK ((`Qty` > 0)));";
    let once = run(sql, enum_to_check());
    assert!(once.contains(r#"CONSTRAINT ck CHECK (("Qty" > 0))"#));
    assert!(once.contains(r#"CHECK ("Status" IN ('a', 'b'))"#));
    assert_eq!(run(&once, enum_to_check()), once);
}

#[test]
fn test_native_enums_are_stable() {
    let options = ConversionOptions {
        native_enums: true,
        ..Default::default()
    };
    let once = run("CREATE TABLE t (s enum('a','b') NOT NULL);", options);
    assert_eq!(
        once,
        "CREATE TYPE IF NOT EXISTS t_s_enum AS ENUM ('a', 'b');\nCREATE TABLE t (\n    s t_s_enum NOT NULL\n);\n"
    );
    assert_eq!(run(&once, options), once);
}

#[test]
fn test_unsigned_bigint_keeps_its_range() {
    let output = run(
        "CREATE TABLE t (a bigint unsigned);\nINSERT INTO t VALUES (18446744073709551615);",
        ConversionOptions::default(),
    );
    assert_eq!(
        output,
        "CREATE TABLE t (\n    a DECIMAL(20)\n);\nINSERT INTO t VALUES (18446744073709551615);\n"
    );
}

const VIEW_DUMP: &str = "/*!50001 DROP VIEW IF EXISTS `v`*/;
/*!50001 CREATE ALGORITHM=UNDEFINED */
/*!50013 DEFINER=`root`@`localhost` SQL SECURITY DEFINER */
/*!50001 VIEW `v` AS select 1 AS `x` */;
";

const TRIGGER_DUMP: &str = "CREATE TABLE t (a int);
/*!50003 SET @saved_sql_mode       = @@sql_mode */ ;
DELIMITER ;;
/*!50003 CREATE*/ /*!50017 DEFINER=`root`@`%`*/ /*!50003 TRIGGER `trg` BEFORE INSERT ON `t` FOR EACH ROW SET NEW.a = 1 */;;
DELIMITER ;
/*!50003 SET sql_mode              = @saved_sql_mode */ ;
";

#[test]
fn test_conditional_view_passes_through() {
    assert_eq!(
        run(VIEW_DUMP, ConversionOptions::default()),
        "DROP VIEW IF EXISTS v;\n\
         CREATE ALGORITHM=UNDEFINED DEFINER=root@localhost SQL SECURITY DEFINER VIEW v AS select 1 AS x;\n"
    );
}

#[test]
fn test_trigger_between_delimiters_passes_through() {
    assert_eq!(
        run(TRIGGER_DUMP, ConversionOptions::default()),
        "CREATE TABLE t (\n    a INT4\n);\n\
         CREATE DEFINER=root@\"%\" TRIGGER trg BEFORE INSERT ON t FOR EACH ROW SET NEW.a = 1;\n"
    );
}

#[test]
fn test_strict_rejects_conditional_views_and_triggers() {
    let strict = ConversionOptions {
        strict: true,
        ..Default::default()
    };
    for (dump, statement) in [(VIEW_DUMP, 2), (TRIGGER_DUMP, 3)] {
        let err = convert(dump.as_bytes(), &strict).unwrap_err();
        assert!(
            matches!(
                &err,
                ConvertError::Map {
                    statement: s,
                    source: MapError::UnmappedStatement { .. },
                    ..
                } if *s == statement
            ),
            "unexpected result {:?}",
            err
        );
    }
}

#[test]
fn test_enum_scenario() {
    let output = run(
        "CREATE TABLE t (status ENUM('a','b','c'));",
        enum_to_check(),
    );
    assert_eq!(
        output,
        "CREATE TABLE t (\n    status STRING,\n    CONSTRAINT t_status_check CHECK (status IN ('a', 'b', 'c'))\n);\n"
    );
}

#[test]
fn test_enum_rerun_adds_nothing() {
    let once = run("CREATE TABLE t (status ENUM('a','b','c'));", enum_to_check());
    assert_eq!(run(&once, enum_to_check()), once);
}

#[test]
fn test_auto_increment_scenario() {
    let output = run(
        "CREATE TABLE t (id INT AUTO_INCREMENT PRIMARY KEY);",
        ConversionOptions::default(),
    );
    assert_eq!(
        output,
        "CREATE SEQUENCE IF NOT EXISTS t_id_seq START WITH 1;\n\
         CREATE TABLE t (\n    id INT4 DEFAULT nextval('t_id_seq'),\n    PRIMARY KEY (id)\n);\n"
    );
    assert!(!output.to_ascii_uppercase().contains("AUTO_INCREMENT"));
}

#[test]
fn test_malformed_input_scenario() {
    let err = convert(
        b"INSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2, 'unfinished",
        &ConversionOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConvertError::Lex(LexError::Unterminated {
            what: "string literal",
            position: Position {
                line: 2,
                column: 26,
                offset: 51,
            },
        })
    );
}

#[test]
fn test_unregistered_type_scenario() {
    let err = convert(
        b"CREATE TABLE `places` (`id` int, `area` polygon NOT NULL);",
        &ConversionOptions::default(),
    )
    .unwrap_err();
    match err {
        ConvertError::Map { statement, source, .. } => {
            assert_eq!(statement, 1);
            assert_eq!(
                source,
                MapError::UnsupportedType {
                    table: "places".into(),
                    column: "area".into(),
                    raw_type: "polygon".into(),
                }
            );
        }
        other => panic!("expected map error, got {:?}", other),
    }
}

#[test]
fn test_statement_order_is_preserved() {
    let output = run(
        "DROP TABLE IF EXISTS b;\nCREATE TABLE b (x int);\nINSERT INTO b VALUES (1);\nDROP TABLE IF EXISTS a;\nCREATE TABLE a (y int);",
        ConversionOptions::default(),
    );
    let firsts: Vec<&str> = output
        .lines()
        .filter(|l| l.starts_with("DROP") || l.starts_with("CREATE") || l.starts_with("INSERT"))
        .collect();
    assert_eq!(
        firsts,
        vec![
            "DROP TABLE IF EXISTS b;",
            "CREATE TABLE b (",
            "INSERT INTO b VALUES (1);",
            "DROP TABLE IF EXISTS a;",
            "CREATE TABLE a (",
        ]
    );
}

#[test]
fn test_unmapped_statements_pass_through() {
    let sql = "CREATE VIEW v AS\n  SELECT `id`, \"name\" FROM users WHERE x = 0x0F;";
    assert_eq!(
        run(sql, ConversionOptions::default()),
        "CREATE VIEW v AS\n  SELECT id, 'name' FROM users WHERE x = x'0F';\n"
    );
}

#[test]
fn test_strict_rejects_unmapped() {
    let options = ConversionOptions {
        strict: true,
        ..Default::default()
    };
    let err = convert(b"SET a = 1;\nCREATE TRIGGER x BEFORE INSERT ON t FOR EACH ROW SET @a = 1;", &options)
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Map {
            statement: 2,
            source: MapError::UnmappedStatement { .. },
            ..
        }
    ));
}

#[test]
fn test_string_escapes_are_normalized() {
    let output = run(
        r#"INSERT INTO t VALUES ('a\tb','c:\\temp','say \"hi\"','50\%');"#,
        ConversionOptions::default(),
    );
    assert_eq!(
        output,
        r#"INSERT INTO t VALUES (e'a\tb',e'c:\\temp','say "hi"',e'50\\%');"#.to_string() + "\n"
    );
}

#[test]
fn test_options_are_independent_per_run() {
    let sql = "CREATE TABLE t (c ENUM('x'));";
    assert!(convert(sql.as_bytes(), &ConversionOptions::default()).is_err());
    assert!(convert(sql.as_bytes(), &enum_to_check()).is_ok());
    assert!(convert(sql.as_bytes(), &ConversionOptions::default()).is_err());
}

#[test]
fn test_wasm_entry_point() {
    let output = convert_dump("CREATE TABLE t (c ENUM('x'));", Some(true)).unwrap();
    assert!(output.contains("CHECK (c IN ('x'))"));
    let err = convert_dump("CREATE TABLE t (c ENUM('x'));", None).unwrap_err();
    assert!(err.contains("enum column `t`.`c`"));
}
