//! The rules `ades` knows about.

use github_actions_models::common::Step;

use super::{ActionRule, Field, Rule, StepRule, Suggestion, Versions};

pub(crate) static STEP_RULES: &[StepRule] = &[StepRule {
    applies_to: has_run,
    rule: &ADES100,
}];

pub(crate) static ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        action: "8398a7/action-slack",
        versions: Versions::Any,
        rule: &ADES107,
    },
    ActionRule {
        action: "actions/github-script",
        versions: Versions::Any,
        rule: &ADES101,
    },
    ActionRule {
        action: "addnab/docker-run-action",
        versions: Versions::Any,
        rule: &ADES105,
    },
    ActionRule {
        action: "appleboy/ssh-action",
        versions: Versions::Any,
        rule: &ADES108,
    },
    ActionRule {
        action: "atlassian/gajira-create",
        versions: Versions::Before("v2.0.1"),
        rule: &ADES202,
    },
    ActionRule {
        action: "cardinalby/js-eval-action",
        versions: Versions::Any,
        rule: &ADES106,
    },
    ActionRule {
        action: "ericcornelissen/git-tag-annotation-action",
        versions: Versions::Before("v1.0.1"),
        rule: &ADES200,
    },
    ActionRule {
        action: "fish-shop/syntax-check",
        versions: Versions::Before("v1.6.12"),
        rule: &ADES206,
    },
    ActionRule {
        action: "kceb/git-message-action",
        versions: Versions::Before("v1.2.0"),
        rule: &ADES201,
    },
    ActionRule {
        action: "lycheeverse/lychee",
        versions: Versions::Before("v2.0.2"),
        rule: &ADES204,
    },
    ActionRule {
        action: "lycheeverse/lychee-action",
        versions: Versions::Before("v2.0.2"),
        rule: &ADES204,
    },
    ActionRule {
        action: "ozi-project/publish",
        versions: Versions::Between("v1.13.2", "v1.13.6"),
        rule: &ADES205,
    },
    // `roots/issue-closer` is the action's old name, and still resolves.
    ActionRule {
        action: "roots/issue-closer-action",
        versions: Versions::Any,
        rule: &ADES102,
    },
    ActionRule {
        action: "roots/issue-closer-action",
        versions: Versions::Any,
        rule: &ADES103,
    },
    ActionRule {
        action: "roots/issue-closer",
        versions: Versions::Any,
        rule: &ADES102,
    },
    ActionRule {
        action: "roots/issue-closer",
        versions: Versions::Any,
        rule: &ADES103,
    },
    ActionRule {
        action: "sergeysova/jq-action",
        versions: Versions::Any,
        rule: &ADES104,
    },
    ActionRule {
        action: "sonarsource/sonarqube-scan-action",
        versions: Versions::Between("v4.0.0", "v5.3.1"),
        rule: &ADES203,
    },
];

pub(crate) static RULES: &[&Rule] = &[
    &ADES100, &ADES101, &ADES102, &ADES103, &ADES104, &ADES105, &ADES106, &ADES107, &ADES108,
    &ADES200, &ADES201, &ADES202, &ADES203, &ADES204, &ADES205, &ADES206,
];

fn has_run(step: &Step) -> bool {
    !step.run.is_empty()
}

static ADES100: Rule = Rule {
    id: "ADES100",
    title: "Expression in 'run:' directive",
    description: r#"
When an expression appears in a 'run:' directive, you can avoid potential attacks by extracting the
expression into an environment variable and using the environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      run: |
        echo 'Hello ${{ inputs.name }}'

it can be made safer by converting it into:

    - name: Example step
      env:
        NAME: ${{ inputs.name }} # <- Assign the expression to an environment variable
      run: |
        echo "Hello $NAME"
      #      ^      ^^^^^
      #      |      | Replace the expression with the environment variable
      #      |
      #      | Note: double quotes are required here for interpolation

How the variable is referenced depends on the runner and shell. For example, on Windows (or with
'shell: powershell') the variable must be referenced as '$Env:NAME'.
"#,
    field: Field::Run,
    suggestion: Suggestion::EnvVar {
        reference: "$NAME",
        passthrough: false,
    },
};

static ADES101: Rule = Rule {
    id: "ADES101",
    title: "Expression in 'actions/github-script' script",
    description: r#"
When an expression appears in an 'actions/github-script' script, you can avoid potential attacks by
extracting the expression into an environment variable and using the environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: actions/github-script@v7
      with:
        script: console.log('Hello ${{ inputs.name }}')

it can be made safer by converting it into:

    - name: Example step
      uses: actions/github-script@v7
      env:
        NAME: ${{ inputs.name }} # <- Assign the expression to an environment variable
      with:
        script: console.log(`Hello ${process.env.NAME}`)
      #                     ^      ^^^^^^^^^^^^^^^^^^^
      #                     |      | Replace the expression with the environment variable
      #                     |
      #                     | Note: backticks are required here for interpolation
"#,
    field: Field::Input("script"),
    suggestion: Suggestion::EnvVar {
        reference: "process.env.NAME",
        passthrough: false,
    },
};

static ADES102: Rule = Rule {
    id: "ADES102",
    title: "Expression in 'issue-close-message' input of 'roots/issue-closer-action'",
    description: r#"
The 'issue-close-message' input of 'roots/issue-closer-action' is interpreted as an ES6-style
template literal. When an expression appears in it, you can avoid potential attacks by extracting
the expression into an environment variable and using the environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: roots/issue-closer-action@v1
      with:
        issue-close-message: Closing ${{ github.event.issue.title }}

it can be made safer by converting it into:

    - name: Example step
      uses: roots/issue-closer-action@v1
      env:
        TITLE: ${{ github.event.issue.title }} # <- Assign the expression to an environment variable
      with:
        issue-close-message: Closing ${process.env.TITLE}
      #                              ^^^^^^^^^^^^^^^^^^^^
      #                              | Replace the expression with the environment variable
"#,
    field: Field::Input("issue-close-message"),
    suggestion: Suggestion::EnvVar {
        reference: "${process.env.NAME}",
        passthrough: false,
    },
};

static ADES103: Rule = Rule {
    id: "ADES103",
    title: "Expression in 'pr-close-message' input of 'roots/issue-closer-action'",
    description: r#"
The 'pr-close-message' input of 'roots/issue-closer-action' is interpreted as an ES6-style template
literal. When an expression appears in it, you can avoid potential attacks by extracting the
expression into an environment variable and using the environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: roots/issue-closer-action@v1
      with:
        pr-close-message: Closing ${{ github.event.pull_request.title }}

it can be made safer by converting it into:

    - name: Example step
      uses: roots/issue-closer-action@v1
      env:
        TITLE: ${{ github.event.pull_request.title }} # <- Assign the expression to an environment variable
      with:
        pr-close-message: Closing ${process.env.TITLE}
      #                           ^^^^^^^^^^^^^^^^^^^^
      #                           | Replace the expression with the environment variable
"#,
    field: Field::Input("pr-close-message"),
    suggestion: Suggestion::EnvVar {
        reference: "${process.env.NAME}",
        passthrough: false,
    },
};

static ADES104: Rule = Rule {
    id: "ADES104",
    title: "Expression in 'cmd' input of 'sergeysova/jq-action'",
    description: r#"
When an expression appears in the 'cmd' input of 'sergeysova/jq-action', you can avoid potential
attacks by extracting the expression into an environment variable and using the environment variable
instead.

For example, given the workflow snippet:

    - name: Example step
      uses: sergeysova/jq-action@v2
      with:
        cmd: jq .version ${{ github.event.inputs.file }} -r

it can be made safer by converting it into:

    - name: Example step
      uses: sergeysova/jq-action@v2
      env:
        FILE: ${{ github.event.inputs.file }} # <- Assign the expression to an environment variable
      with:
        cmd: jq .version "$FILE" -r
      #                  ^^^^^^^
      #                  | Replace the expression with the environment variable
      #                  | Note: double quotes prevent argument splitting
"#,
    field: Field::Input("cmd"),
    suggestion: Suggestion::EnvVar {
        reference: "\"$NAME\"",
        passthrough: false,
    },
};

static ADES105: Rule = Rule {
    id: "ADES105",
    title: "Expression in 'run' input of 'addnab/docker-run-action'",
    description: r#"
When an expression appears in the 'run' input of 'addnab/docker-run-action', the only way to avoid
potential attacks is to remove the expression. There is no safe way to use untrusted input here.

Do NOT pass environment variables into the container through the action's 'options' input instead.
The options aren't validated, so doing so opens up other ways to attack the workflow.
"#,
    field: Field::Input("run"),
    suggestion: Suggestion::Remove,
};

static ADES106: Rule = Rule {
    id: "ADES106",
    title: "Expression in 'expression' input of 'cardinalby/js-eval-action'",
    description: r#"
When an expression appears in the 'expression' input of 'cardinalby/js-eval-action', you can avoid
potential attacks by extracting the expression into an environment variable and using the
environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: cardinalby/js-eval-action@v1
      with:
        expression: 1 + parseInt(${{ inputs.value }})

it can be made safer by converting it into:

    - name: Example step
      uses: cardinalby/js-eval-action@v1
      env:
        VALUE: ${{ inputs.value }} # <- Assign the expression to an environment variable
      with:
        expression: 1 + parseInt(env.VALUE)
      #                          ^^^^^^^^^
      #                          | Replace the expression with the environment variable
"#,
    field: Field::Input("expression"),
    suggestion: Suggestion::EnvVar {
        reference: "env.NAME",
        passthrough: false,
    },
};

static ADES107: Rule = Rule {
    id: "ADES107",
    title: "Expression in 'custom_payload' input of '8398a7/action-slack'",
    description: r#"
When an expression appears in the 'custom_payload' input of '8398a7/action-slack', you can avoid
potential attacks by extracting the expression into an environment variable and using the
environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: 8398a7/action-slack@v3
      with:
        custom_payload: |
          { attachments: [{ color: '${{ inputs.color }}' }] }

it can be made safer by converting it into:

    - name: Example step
      uses: 8398a7/action-slack@v3
      env:
        COLOR: ${{ inputs.color }} # <- Assign the expression to an environment variable
      with:
        custom_payload: |
          { attachments: [{ color: process.env.COLOR }] }
      #                            ^^^^^^^^^^^^^^^^^
      #                            | Replace the expression with the environment variable
"#,
    field: Field::Input("custom_payload"),
    suggestion: Suggestion::EnvVar {
        reference: "process.env.NAME",
        passthrough: false,
    },
};

static ADES108: Rule = Rule {
    id: "ADES108",
    title: "Expression in 'script' input of 'appleboy/ssh-action'",
    description: r#"
When an expression appears in the 'script' input of 'appleboy/ssh-action', you can avoid potential
attacks by extracting the expression into an environment variable, passing it through to the remote
host, and using the environment variable instead.

For example, given the workflow snippet:

    - name: Example step
      uses: appleboy/ssh-action@v1
      with:
        script: echo 'Hello ${{ inputs.name }}'

it can be made safer by converting it into:

    - name: Example step
      uses: appleboy/ssh-action@v1
      env:
        NAME: ${{ inputs.name }} # <- Assign the expression to an environment variable
      with:
        envs: NAME # <- Pass the environment variable through SSH
        script: echo "Hello $NAME"
      #              ^      ^^^^^
      #              |      | Replace the expression with the environment variable
      #              |
      #              | Note: double quotes are required here for interpolation
"#,
    field: Field::Input("script"),
    suggestion: Suggestion::EnvVar {
        reference: "$NAME",
        passthrough: true,
    },
};

static ADES200: Rule = Rule {
    id: "ADES200",
    title: "Expression in 'tag' input of 'ericcornelissen/git-tag-annotation-action'",
    description: r#"
When an expression is used in the 'tag' input of 'ericcornelissen/git-tag-annotation-action' in
v1.0.0 or earlier it may be used to execute arbitrary shell commands, see GHSA-hgx2-4pp9-357g. To
mitigate this, upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("tag"),
    suggestion: Suggestion::Upgrade,
};

static ADES201: Rule = Rule {
    id: "ADES201",
    title: "Expression in 'sha' input of 'kceb/git-message-action'",
    description: r#"
When an expression is used in the 'sha' input of 'kceb/git-message-action' in v1.1.0 or earlier it
may be used to execute arbitrary shell commands (no vulnerability identifier available). To mitigate
this, upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("sha"),
    suggestion: Suggestion::Upgrade,
};

static ADES202: Rule = Rule {
    id: "ADES202",
    title: "Expression in 'summary' input of 'atlassian/gajira-create'",
    description: r#"
When an expression is used in the 'summary' input of 'atlassian/gajira-create' in v2.0.0 or earlier
it may be used to execute arbitrary JavaScript code, see GHSA-4xqx-pqpj-9fqw. To mitigate this,
upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("summary"),
    suggestion: Suggestion::Upgrade,
};

static ADES203: Rule = Rule {
    id: "ADES203",
    title: "Expression in 'args' input of 'SonarSource/sonarqube-scan-action'",
    description: r#"
When an expression is used in the 'args' input of 'SonarSource/sonarqube-scan-action' between v4.0.0
and v5.3.0 it may be used to execute arbitrary shell commands, see GHSA-f79p-9c5r-xg88. To mitigate
this, upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("args"),
    suggestion: Suggestion::Upgrade,
};

static ADES204: Rule = Rule {
    id: "ADES204",
    title: "Expression in 'lycheeVersion' input of 'lycheeverse/lychee'",
    description: r#"
When an expression is used in the 'lycheeVersion' input of 'lycheeverse/lychee' in v2.0.1 or earlier
it may be used to execute arbitrary shell commands, see GHSA-65rg-554r-9j5x. To mitigate this,
upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("lycheeVersion"),
    suggestion: Suggestion::Upgrade,
};

static ADES205: Rule = Rule {
    id: "ADES205",
    title: "Expression in 'pull-request-body' input of 'OZI-Project/publish'",
    description: r#"
When an expression is used in the 'pull-request-body' input of 'OZI-Project/publish' between v1.13.2
and v1.13.5 it may be used to execute arbitrary shell commands, see GHSA-2487-9f55-2vg9. To mitigate
this, upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("pull-request-body"),
    suggestion: Suggestion::Upgrade,
};

static ADES206: Rule = Rule {
    id: "ADES206",
    title: "Expression in 'pattern' input of 'fish-shop/syntax-check'",
    description: r#"
When an expression is used in the 'pattern' input of 'fish-shop/syntax-check' in v1.6.11 or earlier
it may be used to execute arbitrary shell commands, see GHSA-xj87-mqvh-88w2. To mitigate this,
upgrade the action to a non-vulnerable version.
"#,
    field: Field::Input("pattern"),
    suggestion: Suggestion::Upgrade,
};
