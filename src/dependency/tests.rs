// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

#[cfg(test)]
mod test {
    use crate::{
        architecture::Architecture,
        dependency::{
            is_package_name, ArchConstraints, Dependency, Error, Possibility, Relation,
            VersionConstraint, VersionOperator,
        },
        version::Version,
    };

    macro_rules! check_parse_fails {
        ($name:ident, $dep:expr) => {
            #[test]
            fn $name() {
                assert!($dep.parse::<Dependency>().is_err());
            }
        };
    }

    macro_rules! check_parse_error {
        ($name:ident, $dep:expr, $error:pat) => {
            #[test]
            fn $name() {
                let err = $dep.parse::<Dependency>().unwrap_err();
                assert!(matches!(err, $error), "got {:?}", err);
            }
        };
    }

    check_parse_fails!(double_arch_constraints, "foo [amd64] [arm64]");
    check_parse_fails!(double_version_constraint, "foo (= 1.0) (= 2.0)");
    check_parse_fails!(non_alpha_package, "💩");
    check_parse_fails!(spacy_package, "a space");
    check_parse_fails!(unknown_relation, "foo {bar}");
    check_parse_fails!(no_package_arch_constraints, "[amd64]");
    check_parse_fails!(unclosed_paren, "foo (>= 1.0");
    check_parse_fails!(unclosed_bracket, "foo [amd64");
    check_parse_fails!(empty_version, "foo ()");

    check_parse_error!(not_equal_rejected, "foo (!= 1.0)", Error::NotEqualOperator);
    check_parse_error!(diamond_rejected, "foo (<> 1.0)", Error::NotEqualOperator);
    check_parse_error!(lone_lt, "foo (< 1.0)", Error::LoneRelationalOperator);
    check_parse_error!(lone_gt, "foo (> 1.0)", Error::LoneRelationalOperator);
    check_parse_error!(
        mixed_polarity,
        "foo [amd64 !arm64]",
        Error::MixedArchPolarity
    );
    check_parse_error!(short_name, "f", Error::InvalidPackageName(_));
    check_parse_error!(dot_dot_name, "a..b", Error::InvalidPackageName(_));
    check_parse_error!(leading_dash_name, "-foo", Error::InvalidPackageName(_));
    check_parse_error!(trailing_dash_name, "foo-", Error::InvalidPackageName(_));
    check_parse_error!(reserved_name, "tmp", Error::InvalidPackageName(_));
    check_parse_error!(bad_version, "foo (= 1.0-)", Error::InvalidVersion(_));

    macro_rules! check_matches {
        ($name:ident, $dep:expr, $check:expr) => {
            #[test]
            fn $name() {
                let dep: Dependency = $dep.parse().unwrap();
                assert_eq!($check, dep, "expected {:?}, got {:?}", $check, dep);
            }
        };
    }

    macro_rules! check_round_trips {
        ($name:ident, $dep:expr, $check:expr) => {
            #[test]
            fn $name() {
                let dep: Dependency = $dep.parse().unwrap();
                assert_eq!($check, dep.to_string());
            }
        };
    }

    macro_rules! simple_possibility {
        ($possibility:expr) => {
            Dependency {
                relations: vec![Relation {
                    possibilities: vec![$possibility],
                }],
            }
        };
    }

    check_matches!(check_empty, "", Dependency { relations: vec![] });
    check_matches!(check_spaces, "   ", Dependency { relations: vec![] });
    check_matches!(
        check_simple,
        "foo",
        simple_possibility!(Possibility {
            name: "foo".to_owned(),
            ..Default::default()
        })
    );
    check_matches!(
        check_version,
        "foo (>= 1.0)",
        simple_possibility!(Possibility {
            name: "foo".to_owned(),
            version_constraint: Some(VersionConstraint {
                operator: VersionOperator::GreaterThanOrEqual,
                version: "1.0".parse::<Version>().unwrap(),
            }),
            ..Default::default()
        })
    );
    check_matches!(
        check_default_operator,
        "foo (1.0)",
        simple_possibility!(Possibility {
            name: "foo".to_owned(),
            version_constraint: Some(VersionConstraint {
                operator: VersionOperator::GreaterThanOrEqual,
                version: "1.0".parse::<Version>().unwrap(),
            }),
            ..Default::default()
        })
    );
    check_matches!(
        check_arch_masks,
        "foo [!linux-amd64 !linux-arm64]",
        simple_possibility!(Possibility {
            name: "foo".to_owned(),
            arch_constraints: Some(ArchConstraints {
                negated: true,
                arches: vec![
                    "linux-amd64".parse::<Architecture>().unwrap(),
                    "linux-arm64".parse::<Architecture>().unwrap(),
                ],
            }),
            ..Default::default()
        })
    );
    check_matches!(
        check_alternatives,
        "foo, bar | baz",
        Dependency {
            relations: vec![
                Relation {
                    possibilities: vec![Possibility {
                        name: "foo".to_owned(),
                        ..Default::default()
                    }]
                },
                Relation {
                    possibilities: vec![
                        Possibility {
                            name: "bar".to_owned(),
                            ..Default::default()
                        },
                        Possibility {
                            name: "baz".to_owned(),
                            ..Default::default()
                        },
                    ]
                },
            ],
        }
    );

    check_round_trips!(round_trip_simple, "foo", "foo");
    check_round_trips!(round_trip_trailing_comma, "foo,", "foo");
    check_round_trips!(round_trip_ge_omitted, "foo (>= 1.0)", "foo (1.0)");
    check_round_trips!(round_trip_eq, "foo ( = 1.0 )", "foo (= 1.0)");
    check_round_trips!(round_trip_lt, "foo (<< 2.0)", "foo (<< 2.0)");
    check_round_trips!(
        round_trip_alternatives,
        "foo,bar|baz (3.0)",
        "foo, bar | baz (3.0)"
    );
    check_round_trips!(
        round_trip_arch,
        "foo [linux-amd64  linux-arm64]",
        "foo [linux-amd64 linux-arm64]"
    );
    check_round_trips!(round_trip_negated_arch, "foo [!linux-amd64]", "foo [!linux-amd64]");
    check_round_trips!(round_trip_multiline, "foo,\n bar", "foo, bar");

    #[test]
    fn reparse_round_trip() {
        for v in [
            "foo, bar | baz (= 2.0), quux (1.0) [linux-amd64]",
            "libfoo (<< 3.0) [!linux-arm64], libbar",
        ] {
            let dep: Dependency = v.parse().unwrap();
            let again: Dependency = dep.to_string().parse().unwrap();
            assert_eq!(dep, again);
        }
    }

    #[test]
    fn to_string_without_arch() {
        let dep: Dependency = "foo (= 2.0) [linux-amd64], bar".parse().unwrap();
        assert_eq!("foo (= 2.0), bar", dep.to_string_without_arch());
    }

    #[test]
    fn version_matching() {
        let dep: Dependency = "foo (>= 2.0)".parse().unwrap();
        let possibility = &dep.relations[0].possibilities[0];
        assert!(possibility.version_matches(&"2.0".parse().unwrap()));
        assert!(possibility.version_matches(&"2.1".parse().unwrap()));
        assert!(!possibility.version_matches(&"1.9".parse().unwrap()));

        let dep: Dependency = "foo (<< 2.0)".parse().unwrap();
        let possibility = &dep.relations[0].possibilities[0];
        assert!(possibility.version_matches(&"1.9".parse().unwrap()));
        assert!(!possibility.version_matches(&"2.0".parse().unwrap()));
    }

    #[test]
    fn arch_mask_applicability() {
        let target: Architecture = "linux-amd64".parse().unwrap();

        let dep: Dependency = "foo [linux-amd64]".parse().unwrap();
        assert!(dep.relations[0].possibilities[0].applies_to(&target, false));

        let dep: Dependency = "foo [!linux-amd64]".parse().unwrap();
        assert!(!dep.relations[0].possibilities[0].applies_to(&target, false));

        let dep: Dependency = "foo [linux-arm64]".parse().unwrap();
        assert!(!dep.relations[0].possibilities[0].applies_to(&target, false));

        let dep: Dependency = "foo".parse().unwrap();
        assert!(dep.relations[0].possibilities[0].applies_to(&target, false));
    }

    #[test]
    fn package_names() {
        assert!(is_package_name("foo"));
        assert!(is_package_name("libc6"));
        assert!(is_package_name("foo-bar.baz+qux"));
        assert!(is_package_name("core"));
        assert!(!is_package_name(""));
        assert!(!is_package_name("f"));
        assert!(!is_package_name("Foo"));
        assert!(!is_package_name(".foo"));
        assert!(!is_package_name("foo."));
        assert!(!is_package_name("fo..o"));
        assert!(!is_package_name("tmp"));
        assert!(!is_package_name("com1"));
        // the device names are reserved under any extension
        assert!(!is_package_name("con.txt"));
        assert!(!is_package_name("aux.c"));
        assert!(!is_package_name("nul.foo"));
        assert!(!is_package_name("lpt1.x"));
        // but only as the whole stem, and tmp only as the whole name
        assert!(is_package_name("console"));
        assert!(is_package_name("tmp.txt"));
    }
}

// vim: foldmethod=marker
